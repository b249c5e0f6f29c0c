// Adapters layer: concrete implementations of the storage port.

pub mod local;
pub mod supabase;

pub use local::LocalStorage;
pub use supabase::SupabaseStorage;
