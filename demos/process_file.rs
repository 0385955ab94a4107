//! Example: Denoise an audio file with RNNoise
//!
//! Usage: cargo run --example process_file -- input.wav output.wav [--stereo]

use rnnoise_rt::{DenoiseStream, Frame, BLOCK_SIZE, SAMPLE_RATE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input.wav> <output.wav> [--stereo]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let stereo = args.iter().any(|a| a == "--stereo");

    // Read input audio
    let mut reader = hound::WavReader::open(input_path)?;
    let spec = reader.spec();
    println!(
        "Input: {} Hz, {} channels, {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );

    if spec.sample_rate != SAMPLE_RATE {
        eprintln!(
            "Warning: Input sample rate {} != required {}. Resample first!",
            spec.sample_rate, SAMPLE_RATE
        );
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|s| s.unwrap() as f32 / 32768.0)
                .collect(),
            24 | 32 => reader
                .samples::<i32>()
                .map(|s| s.unwrap() as f32 / 2147483648.0)
                .collect(),
            _ => {
                eprintln!("Unsupported bits per sample: {}", spec.bits_per_sample);
                std::process::exit(1);
            }
        },
    };

    // Build stereo frames; mono input is duplicated into both lanes.
    let mut frames: Vec<Frame> = if spec.channels == 2 {
        samples.chunks(2).map(|c| Frame::new(c[0], c[1])).collect()
    } else {
        samples.iter().map(|&s| Frame::new(s, s)).collect()
    };
    let input_len = frames.len();

    let mut stream = DenoiseStream::new(spec.sample_rate);
    stream.set_stereo(stereo);
    println!(
        "Processing {} frames ({:.2}s), stereo: {}, added latency: {:.0}ms",
        frames.len(),
        frames.len() as f32 / SAMPLE_RATE as f32,
        stereo,
        stream.latency_ms()
    );

    let start = std::time::Instant::now();

    // Feed in fixed callback-sized chunks like a host would; pad the tail so
    // the final chunk is never below one block.
    let chunk = BLOCK_SIZE * 2;
    let pad = (chunk - frames.len() % chunk) % chunk;
    frames.extend(std::iter::repeat(Frame::default()).take(pad));

    let mut out_frames: Vec<Frame> = Vec::with_capacity(frames.len() + BLOCK_SIZE);
    let mut out_chunk = vec![Frame::default(); chunk];
    for callback in frames.chunks(chunk) {
        stream.process(callback, &mut out_chunk);
        out_frames.extend_from_slice(&out_chunk);
    }
    // Recover the tail still sitting in the queues.
    out_frames.extend(stream.flush());
    out_frames.truncate(input_len + BLOCK_SIZE);

    let elapsed = start.elapsed();
    let rtf = elapsed.as_secs_f32() / (frames.len() as f32 / SAMPLE_RATE as f32);
    println!("Done in {:.2}s (RTF: {:.3}x realtime)", elapsed.as_secs_f32(), rtf);
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
