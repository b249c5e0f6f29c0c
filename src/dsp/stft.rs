use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Analysis frame length shared by the spectral stages.
pub const N_FFT: usize = 2048;
/// Analysis hop shared by the spectral stages.
pub const HOP: usize = 512;

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

/// Short-time Fourier transform. Returns one half-spectrum
/// (`n_fft / 2 + 1` bins) per frame; frames start every `hop` samples and
/// input shorter than one frame yields no frames.
pub fn stft(samples: &[f32], n_fft: usize, hop: usize) -> Vec<Vec<Complex<f32>>> {
    if samples.len() < n_fft {
        return Vec::new();
    }

    let window = hann_window(n_fft);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

    let mut frames = Vec::new();
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); n_fft];

    let mut start = 0;
    while start + n_fft <= samples.len() {
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(samples[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..n_fft / 2 + 1].to_vec());
        start += hop;
    }

    frames
}

/// Inverse STFT by overlap-add with a matching Hann synthesis window and
/// squared-window normalization. Output is trimmed or zero-padded to
/// `out_len`.
pub fn istft(frames: &[Vec<Complex<f32>>], n_fft: usize, hop: usize, out_len: usize) -> Vec<f32> {
    if frames.is_empty() {
        return vec![0.0; out_len];
    }

    let window = hann_window(n_fft);
    let ifft = FftPlanner::<f32>::new().plan_fft_inverse(n_fft);

    let total = (frames.len() - 1) * hop + n_fft;
    let mut out = vec![0.0_f32; total];
    let mut norm = vec![0.0_f32; total];
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); n_fft];

    for (f, frame) in frames.iter().enumerate() {
        // Rebuild the full spectrum from the half-spectrum frame.
        buffer[..frame.len()].copy_from_slice(frame);
        for k in 1..n_fft / 2 {
            buffer[n_fft - k] = frame[k].conj();
        }
        ifft.process(&mut buffer);

        let offset = f * hop;
        for i in 0..n_fft {
            // rustfft leaves the inverse unscaled.
            let sample = buffer[i].re / n_fft as f32;
            out[offset + i] += sample * window[i];
            norm[offset + i] += window[i] * window[i];
        }
    }

    for (sample, n) in out.iter_mut().zip(norm.iter()) {
        if *n > 1e-8 {
            *sample /= n;
        }
    }

    out.resize(out_len, 0.0);
    out
}
