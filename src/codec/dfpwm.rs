//! DFPWM codec backed by libavcodec
//!
//! A fresh encoder or decoder context is opened for every call, so each
//! request starts from the codec's initial predictor state and nothing is
//! shared between requests.

use bytes::{Bytes, BytesMut};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type};

use super::AudioCodec;
use crate::config::CodecConfig;
use crate::error::{FfmpegError, Result, ToolsError};
use crate::ffmpeg::DFPWM_CODEC_NAME;

/// Sample format on the PCM side of the codec
pub const PCM_SAMPLE_FMT: Sample = Sample::U8(Type::Packed);

/// DFPWM packs eight samples into every byte
pub const SAMPLES_PER_BYTE: usize = 8;

/// Mono DFPWM codec
#[derive(Debug, Clone)]
pub struct DfpwmCodec {
    sample_rate: u32,
    frame_samples: usize,
}

impl DfpwmCodec {
    pub fn new(config: &CodecConfig) -> Self {
        // Every frame but the last must fill whole bytes.
        let frame_samples =
            (config.frame_samples / SAMPLES_PER_BYTE).max(1) * SAMPLES_PER_BYTE;
        Self {
            sample_rate: config.sample_rate,
            frame_samples,
        }
    }

    fn open_encoder(&self) -> Result<ffmpeg::encoder::Audio> {
        let codec = ffmpeg::encoder::find_by_name(DFPWM_CODEC_NAME).ok_or_else(|| {
            FfmpegError::CodecNotFound("DFPWM encoder not found in this FFmpeg build".into())
        })?;

        let mut context = codec::Context::new_with_codec(codec);
        context.set_time_base(ffmpeg::Rational::new(1, self.sample_rate as i32));

        let mut audio_enc = context.encoder().audio().map_err(|e| {
            FfmpegError::EncoderOpen(format!("Cannot get audio encoder handle: {}", e))
        })?;

        audio_enc.set_rate(self.sample_rate as i32);
        audio_enc.set_format(PCM_SAMPLE_FMT);
        audio_enc.set_channel_layout(ChannelLayout::MONO);
        audio_enc.set_bit_rate(self.sample_rate as usize);

        let encoder = audio_enc
            .open_as(codec)
            .map_err(|e| FfmpegError::EncoderOpen(format!("Failed to open DFPWM encoder: {}", e)))?;
        Ok(encoder)
    }

    fn open_decoder(&self) -> Result<ffmpeg::decoder::Audio> {
        let codec = ffmpeg::decoder::find_by_name(DFPWM_CODEC_NAME).ok_or_else(|| {
            FfmpegError::CodecNotFound("DFPWM decoder not found in this FFmpeg build".into())
        })?;

        let mut context = codec::Context::new_with_codec(codec);
        // The decoder refuses to open without a channel count, and the
        // safe wrapper has no setter for it before opening.
        unsafe {
            let ctx = context.as_mut_ptr();
            (*ctx).sample_rate = self.sample_rate as i32;
            ffmpeg::ffi::av_channel_layout_default(&mut (*ctx).ch_layout, 1);
        }

        let decoder = context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.audio())
            .map_err(|e| FfmpegError::DecoderOpen(format!("Failed to open DFPWM decoder: {}", e)))?;
        Ok(decoder)
    }
}

impl AudioCodec for DfpwmCodec {
    fn encode(&self, pcm: &[u8]) -> Result<Bytes> {
        let mut encoder = self.open_encoder()?;
        let mut out = BytesMut::with_capacity(pcm.len().div_ceil(SAMPLES_PER_BYTE));
        let mut pts = 0i64;

        for chunk in pcm.chunks(self.frame_samples) {
            let mut frame =
                ffmpeg::util::frame::Audio::new(PCM_SAMPLE_FMT, chunk.len(), ChannelLayout::MONO);
            frame.set_rate(self.sample_rate);
            frame.set_pts(Some(pts));
            frame.data_mut(0)[..chunk.len()].copy_from_slice(chunk);
            pts += chunk.len() as i64;

            encoder
                .send_frame(&frame)
                .map_err(|e| FfmpegError::EncodeFrame(format!("send_frame error: {}", e)))?;
            drain_packets(&mut encoder, &mut out)?;
        }

        encoder
            .send_eof()
            .map_err(|e| FfmpegError::EncodeFrame(format!("send_eof error: {}", e)))?;
        drain_packets(&mut encoder, &mut out)?;

        tracing::debug!(samples = pcm.len(), bytes = out.len(), "DFPWM encode complete");
        Ok(out.freeze())
    }

    fn decode(&self, encoded: &[u8]) -> Result<Bytes> {
        let mut decoder = self.open_decoder()?;
        let mut out = BytesMut::with_capacity(encoded.len() * SAMPLES_PER_BYTE);
        let packet_bytes = self.frame_samples / SAMPLES_PER_BYTE;

        for chunk in encoded.chunks(packet_bytes) {
            let packet = ffmpeg::codec::packet::Packet::copy(chunk);
            decoder
                .send_packet(&packet)
                .map_err(|e| FfmpegError::DecodePacket(format!("send_packet error: {}", e)))?;
            drain_frames(&mut decoder, &mut out)?;
        }

        match decoder.send_eof() {
            Ok(()) | Err(ffmpeg::Error::Eof) => {}
            Err(e) => {
                return Err(FfmpegError::DecodePacket(format!("send_eof error: {}", e)).into())
            }
        }
        drain_frames(&mut decoder, &mut out)?;

        tracing::debug!(bytes = encoded.len(), samples = out.len(), "DFPWM decode complete");
        Ok(out.freeze())
    }
}

/// Move every packet the encoder has ready into `out`.
fn drain_packets(encoder: &mut ffmpeg::encoder::Audio, out: &mut BytesMut) -> Result<()> {
    let mut packet = ffmpeg::codec::packet::Packet::empty();
    loop {
        match encoder.receive_packet(&mut packet) {
            Ok(()) => {
                if let Some(data) = packet.data() {
                    out.extend_from_slice(data);
                }
            }
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => return Ok(()),
            Err(ffmpeg::Error::Eof) => return Ok(()),
            Err(e) => {
                return Err(ToolsError::Ffmpeg(FfmpegError::EncodeFrame(format!(
                    "receive_packet error: {}",
                    e
                ))))
            }
        }
    }
}

/// Move every decoded frame's samples into `out`.
fn drain_frames(decoder: &mut ffmpeg::decoder::Audio, out: &mut BytesMut) -> Result<()> {
    let mut frame = ffmpeg::util::frame::Audio::empty();
    loop {
        match decoder.receive_frame(&mut frame) {
            Ok(()) => {
                // Mono packed u8: one byte per sample
                let samples = frame.samples();
                out.extend_from_slice(&frame.data(0)[..samples]);
            }
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => return Ok(()),
            Err(ffmpeg::Error::Eof) => return Ok(()),
            Err(e) => {
                return Err(ToolsError::Ffmpeg(FfmpegError::DecodePacket(format!(
                    "receive_frame error: {}",
                    e
                ))))
            }
        }
    }
}
