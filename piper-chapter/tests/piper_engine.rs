//! Runs PiperEngine against a stand-in shell script.
//!
//! The script copies the WAV named by `--model` to the `-f` path and saves
//! the text it read from stdin next to it. Models named `fail` and `silent`
//! exit with status 3 and exit cleanly without output, respectively.

#![cfg(unix)]

use async_trait::async_trait;
use piper_chapter::tts::RawVoiceSettings;
use piper_chapter::{
    AudioTags, PiperEngine, Pipeline, PipelineError, SynthesisEngine, SynthesisRequest,
    TagWriter, TextChunk, VoiceConfiguration,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const FAKE_PIPER: &str = r#"#!/bin/sh
model=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --model) model="$2"; shift 2 ;;
    -f) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
cat > "$out.txt"
if [ "$model" = "fail" ]; then
  echo "model not found" >&2
  exit 3
fi
if [ "$model" = "silent" ]; then
  exit 0
fi
cp "$model" "$out"
"#;

struct NoTags;

#[async_trait]
impl TagWriter for NoTags {
    async fn write_tags(
        &self,
        _path: &Path,
        _format: &str,
        _tags: &AudioTags,
    ) -> piper_chapter::Result<()> {
        Ok(())
    }
}

fn install_fake_piper(dir: &Path) -> PathBuf {
    let path = dir.join("piper");
    std::fs::write(&path, FAKE_PIPER).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn write_source_wav(path: &Path, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn voice(model: &str, format: &str) -> VoiceConfiguration {
    VoiceConfiguration::resolve(&RawVoiceSettings {
        model: Some(model.to_string()),
        output_format: Some(format.to_string()),
        ..Default::default()
    })
}

// Kept as one test so no other thread forks while the script is being written.
#[tokio::test]
async fn piper_process_contract() {
    let temp_dir = TempDir::new().unwrap();
    let piper = install_fake_piper(temp_dir.path());
    let engine = PiperEngine::new(&piper);

    let source = temp_dir.path().join("voice.wav");
    let source_samples: Vec<i16> = (0..2205).map(|i| (i % 200) as i16 * 50).collect();
    write_source_wav(&source, &source_samples);
    let model = source.to_string_lossy().into_owned();

    // Text goes in on stdin, audio comes out at the -f path
    let chunk = TextChunk::new(1, "Call me Ishmael.");
    let destination = temp_dir.path().join("piper1.wav");
    engine
        .synthesize(&chunk, &voice(&model, "wav"), &destination)
        .await
        .unwrap();
    assert!(destination.is_file());
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("piper1.wav.txt")).unwrap(),
        "Call me Ishmael."
    );

    // Non-zero exit carries the chunk index, status and stderr
    let chunk = TextChunk::new(4, "Some years ago.");
    let err = engine
        .synthesize(&chunk, &voice("fail", "wav"), &temp_dir.path().join("piper4.wav"))
        .await
        .unwrap_err();
    match err {
        PipelineError::SynthesisEngineFailure {
            chunk_index,
            exit_status,
            ref message,
        } => {
            assert_eq!(chunk_index, 4);
            assert_eq!(exit_status, Some(3));
            assert!(message.contains("model not found"));
        }
        ref other => panic!("unexpected error: {}", other),
    }

    // A clean exit without output is still a failure
    let err = engine
        .synthesize(&chunk, &voice("silent", "wav"), &temp_dir.path().join("piper5.wav"))
        .await
        .unwrap_err();
    assert_eq!(err.chunk_index(), Some(4));

    // Whole run: two chunks of the same voice back to back
    let work = temp_dir.path().join("work");
    std::fs::create_dir(&work).unwrap();
    let pipeline = Pipeline::new(voice(&model, "wav"), Arc::new(engine))
        .with_tagger(Arc::new(NoTags))
        .with_max_chunk_chars(20)
        .with_temp_root(&work);
    let output = temp_dir.path().join("chapter.wav");

    let outcome = pipeline
        .run(&SynthesisRequest::new(
            "Call me Ishmael. Some years ago.",
            &output,
            AudioTags::new(1, "Loomings"),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.chunks, 2);
    let mut reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, [source_samples.clone(), source_samples].concat());
    assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
}
