//! 语音合成
//!
//! 目前只有离线实现：输出一秒静音的 16 位单声道 WAV。

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::config::VoiceConfig;
use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// 合成 WAV 音频
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// 静音合成器
pub struct MockSynthesizer {
    sample_rate: u32,
}

impl MockSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

/// 16 位单声道 PCM 的 WAV 封装
fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (samples.len() * block_align as usize) as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        tracing::debug!(voice_id, chars = text.len(), "Synthesizing silent audio");
        let silence = vec![0i16; self.sample_rate as usize];
        Ok(wav_bytes(self.sample_rate, &silence))
    }
}

pub fn create_synthesizer(config: &VoiceConfig) -> Arc<dyn SpeechSynthesizer> {
    Arc::new(MockSynthesizer::new(config.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_second_of_silence() {
        let synth = MockSynthesizer::new(22050);
        let audio = synth.synthesize("Hello there", "default").await.unwrap();

        assert_eq!(&audio[0..4], b"RIFF");
        assert_eq!(&audio[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(audio[24..28].try_into().unwrap()), 22050);
        assert_eq!(u32::from_le_bytes(audio[40..44].try_into().unwrap()), 44100);
        assert_eq!(audio.len(), 44 + 44100);
        assert!(audio[44..].iter().all(|b| *b == 0));
    }
}
