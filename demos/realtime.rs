//! Example: Simulated real-time streaming with per-callback timing
//!
//! Feeds a WAV file through the denoiser in audio-callback-sized chunks and
//! reports how much of the callback period budget each chunk consumed.
//!
//! Usage: cargo run --example realtime -- input.wav output.wav [chunk_frames]

use rnnoise_rt::{DenoiseStream, Frame, BLOCK_SIZE, SAMPLE_RATE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input.wav> <output.wav> [chunk_frames]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let chunk: usize = if args.len() > 3 {
        args[3].parse()?
    } else {
        512
    };
    if chunk < BLOCK_SIZE {
        eprintln!(
            "Note: chunks of {} frames are below one denoiser block ({}); the stream will warn and emit silence",
            chunk, BLOCK_SIZE
        );
    }

    // Read input audio
    let mut reader = hound::WavReader::open(input_path)?;
    let spec = reader.spec();
    println!(
        "Input: {} Hz, {} channels, {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );
    if spec.sample_rate != SAMPLE_RATE {
        eprintln!(
            "Warning: sample rate {} != required {}. Resample first!",
            spec.sample_rate, SAMPLE_RATE
        );
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f32 / 32768.0)
            .collect(),
    };
    let mut frames: Vec<Frame> = if spec.channels == 2 {
        samples.chunks(2).map(|c| Frame::new(c[0], c[1])).collect()
    } else {
        samples.iter().map(|&s| Frame::new(s, s)).collect()
    };
    // Pad to a chunk multiple so every simulated callback is full-sized.
    let pad = (chunk - frames.len() % chunk) % chunk;
    frames.extend(std::iter::repeat(Frame::default()).take(pad));

    let mut stream = DenoiseStream::new(spec.sample_rate);
    stream.set_stereo(spec.channels == 2);

    let callback_budget =
        std::time::Duration::from_secs_f64(chunk as f64 / SAMPLE_RATE as f64);
    println!(
        "Processing {} frames ({:.2}s) in {}-frame callbacks (budget: {:.2}ms/callback)",
        frames.len(),
        frames.len() as f32 / SAMPLE_RATE as f32,
        chunk,
        callback_budget.as_secs_f64() * 1000.0
    );

    let mut out_frames: Vec<Frame> = Vec::with_capacity(frames.len() + BLOCK_SIZE);
    let mut out_chunk = vec![Frame::default(); chunk];

    let mut callback_count: u64 = 0;
    let mut overrun_count: u64 = 0;
    let mut max_time = std::time::Duration::ZERO;
    let mut total_time = std::time::Duration::ZERO;

    let start = std::time::Instant::now();

    for callback in frames.chunks(chunk) {
        let t0 = std::time::Instant::now();
        stream.process(callback, &mut out_chunk);
        let dt = t0.elapsed();

        total_time += dt;
        callback_count += 1;
        if dt > max_time {
            max_time = dt;
        }
        if dt > callback_budget {
            overrun_count += 1;
            eprintln!(
                "OVERRUN callback {}: {:.2}ms > {:.2}ms budget",
                callback_count,
                dt.as_secs_f64() * 1000.0,
                callback_budget.as_secs_f64() * 1000.0
            );
        }

        out_frames.extend_from_slice(&out_chunk);
    }
    out_frames.extend(stream.flush());

    let elapsed = start.elapsed();
    let rtf = elapsed.as_secs_f32() / (frames.len() as f32 / SAMPLE_RATE as f32);
    let avg_ms = if callback_count > 0 {
        total_time.as_secs_f64() * 1000.0 / callback_count as f64
    } else {
        0.0
    };
    println!("Done in {:.2}s (RTF: {:.3}x realtime)", elapsed.as_secs_f32(), rtf);
    println!(
        "Callbacks: {}, avg: {:.3}ms, max: {:.3}ms, budget overruns: {}",
        callback_count,
        avg_ms,
        max_time.as_secs_f64() * 1000.0,
        overrun_count
    );
    println!("Final voice activity: {:.3}", stream.voice_activity());

    // Write output
    let out_spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output_path, out_spec)?;
    for frame in &out_frames {
        for s in [frame.left, frame.right] {
            writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)?;
        }
    }
    writer.finalize()?;

    println!("Saved to {}", output_path);
    Ok(())
}
