//! Field encodings, predictors and sign extension for blackbox frames

use crate::parser::stream::BBLDataStream;
use crate::types::{FrameDefinition, HeaderMap};
use anyhow::{bail, Result};

pub const ENCODING_SIGNED_VB: u8 = 0;
pub const ENCODING_UNSIGNED_VB: u8 = 1;
pub const ENCODING_NEG_14BIT: u8 = 3;
pub const ENCODING_TAG8_8SVB: u8 = 6;
pub const ENCODING_TAG2_3S32: u8 = 7;
pub const ENCODING_TAG8_4S16: u8 = 8;
pub const ENCODING_NULL: u8 = 9;
pub const ENCODING_TAG2_3SVARIABLE: u8 = 10;

pub const PREDICT_0: u8 = 0;
pub const PREDICT_PREVIOUS: u8 = 1;
pub const PREDICT_STRAIGHT_LINE: u8 = 2;
pub const PREDICT_AVERAGE_2: u8 = 3;
pub const PREDICT_MINTHROTTLE: u8 = 4;
pub const PREDICT_MOTOR_0: u8 = 5;
pub const PREDICT_INC: u8 = 6;
pub const PREDICT_HOME_COORD: u8 = 7;
pub const PREDICT_1500: u8 = 8;
pub const PREDICT_VBATREF: u8 = 9;
pub const PREDICT_LAST_MAIN_FRAME_TIME: u8 = 10;
pub const PREDICT_MINMOTOR: u8 = 11;

pub fn sign_extend_2bit(value: u8) -> i64 {
    if value & 0x02 != 0 {
        (value as i64) | !0x03
    } else {
        (value & 0x03) as i64
    }
}

pub fn sign_extend_4bit(value: u8) -> i64 {
    if value & 0x08 != 0 {
        (value as i64) | !0x0f
    } else {
        (value & 0x0f) as i64
    }
}

pub fn sign_extend_5bit(value: u8) -> i64 {
    if value & 0x10 != 0 {
        (value as i64) | !0x1f
    } else {
        (value & 0x1f) as i64
    }
}

pub fn sign_extend_6bit(value: u8) -> i64 {
    if value & 0x20 != 0 {
        (value as i64) | !0x3f
    } else {
        (value & 0x3f) as i64
    }
}

pub fn sign_extend_7bit(value: u8) -> i64 {
    if value & 0x40 != 0 {
        (value as i64) | !0x7f
    } else {
        (value & 0x7f) as i64
    }
}

pub fn sign_extend_8bit(value: u8) -> i64 {
    value as i8 as i64
}

/// Two's complement on 14 bits
pub fn sign_extend_14bit(value: u16) -> i64 {
    if value & 0x2000 != 0 {
        (value as i64 & 0x3fff) | !0x3fff
    } else {
        (value & 0x3fff) as i64
    }
}

pub fn sign_extend_16bit(value: u16) -> i64 {
    value as i16 as i64
}

pub fn sign_extend_24bit(value: u32) -> i64 {
    if value & 0x80_0000 != 0 {
        (value | 0xff00_0000) as i32 as i64
    } else {
        (value & 0x7f_ffff) as i64
    }
}

/// Header-derived constants the predictors refer to
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorContext {
    pub minthrottle: i64,
    pub vbatref: i64,
    pub min_motor: i64,
    pub motor0_index: Option<usize>,
    pub home_coord: [i64; 2],
    pub last_main_frame_time: i64,
}

impl PredictorContext {
    pub fn from_headers(headers: &HeaderMap, main_frame: &FrameDefinition) -> Self {
        let min_motor = headers
            .get("motorOutput")
            .and_then(|v| v.as_i64())
            .unwrap_or(48);

        Self {
            minthrottle: headers.get_i64("minthrottle").unwrap_or(1150),
            vbatref: headers.get_i64("vbatref").unwrap_or(4095),
            min_motor,
            motor0_index: main_frame.index_of("motor[0]"),
            home_coord: [0, 0],
            last_main_frame_time: 0,
        }
    }
}

/// Decode every field of one frame body into `current`.
///
/// `previous`/`previous2` are the reference frames for delta predictors; an
/// intra frame passes `None` and the delta predictors fall back to the raw value.
pub fn decode_frame_fields(
    stream: &mut BBLDataStream,
    def: &FrameDefinition,
    current: &mut [i64],
    previous: Option<&[i64]>,
    previous2: Option<&[i64]>,
    skipped_frames: i64,
    ctx: &PredictorContext,
) -> Result<()> {
    let count = def.count();
    if current.len() < count {
        bail!(
            "frame buffer holds {} values but definition has {} fields",
            current.len(),
            count
        );
    }
    let mut values = [0i64; 8];
    let mut i = 0;

    while i < count {
        let field = &def.fields[i];

        let group = match field.encoding {
            ENCODING_TAG8_4S16 => {
                stream.read_tag8_4s16(&mut values)?;
                4
            }
            ENCODING_TAG2_3S32 => {
                stream.read_tag2_3s32(&mut values)?;
                3
            }
            ENCODING_TAG2_3SVARIABLE => {
                stream.read_tag2_3svariable(&mut values)?;
                3
            }
            ENCODING_TAG8_8SVB => {
                // Groups consecutive fields sharing the encoding, up to 8
                let run = def.fields[i..]
                    .iter()
                    .take(8)
                    .take_while(|f| f.encoding == ENCODING_TAG8_8SVB)
                    .count();
                stream.read_tag8_8svb(&mut values, run)?;
                run
            }
            ENCODING_SIGNED_VB => {
                values[0] = stream.read_signed_vb()?;
                1
            }
            ENCODING_UNSIGNED_VB => {
                values[0] = stream.read_unsigned_vb()? as i64;
                1
            }
            ENCODING_NEG_14BIT => {
                values[0] = stream.read_neg_14bit()?;
                1
            }
            ENCODING_NULL => {
                values[0] = 0;
                1
            }
            other => bail!("unsupported field encoding {} for '{}'", other, field.name),
        };

        for (j, raw) in values.iter().take(group).enumerate() {
            let index = i + j;
            if index >= count {
                break;
            }
            let predictor = def.fields[index].predictor;
            current[index] = apply_predictor(
                predictor, *raw, index, current, previous, previous2, skipped_frames, ctx,
            )?;
        }

        i += group;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn apply_predictor(
    predictor: u8,
    raw: i64,
    index: usize,
    current: &[i64],
    previous: Option<&[i64]>,
    previous2: Option<&[i64]>,
    skipped_frames: i64,
    ctx: &PredictorContext,
) -> Result<i64> {
    let prev = previous.and_then(|p| p.get(index).copied());
    let prev2 = previous2.and_then(|p| p.get(index).copied());

    let value = match predictor {
        PREDICT_0 => raw,
        PREDICT_PREVIOUS => raw + prev.unwrap_or(0),
        PREDICT_STRAIGHT_LINE => match (prev, prev2) {
            (Some(p1), Some(p2)) => raw + 2 * p1 - p2,
            _ => raw,
        },
        PREDICT_AVERAGE_2 => match (prev, prev2) {
            (Some(p1), Some(p2)) => raw + (p1 + p2) / 2,
            _ => raw,
        },
        PREDICT_MINTHROTTLE => raw + ctx.minthrottle,
        PREDICT_MOTOR_0 => {
            let motor0 = ctx
                .motor0_index
                .and_then(|idx| current.get(idx).copied())
                .unwrap_or(0);
            raw + motor0
        }
        PREDICT_INC => prev.unwrap_or(0) + skipped_frames + 1,
        PREDICT_HOME_COORD => raw + ctx.home_coord[index % 2],
        PREDICT_1500 => raw + 1500,
        PREDICT_VBATREF => raw + ctx.vbatref,
        PREDICT_LAST_MAIN_FRAME_TIME => raw + ctx.last_main_frame_time,
        PREDICT_MINMOTOR => raw + ctx.min_motor,
        other => bail!("unsupported predictor {}", other),
    };

    Ok(value)
}
