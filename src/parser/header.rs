use crate::types::{FrameDefinition, HeaderMap, HeaderValue};
use anyhow::{anyhow, Result};

/// Field layouts of every frame type a recording declares
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogDefinitions {
    pub i_frame: FrameDefinition,
    pub p_frame: FrameDefinition,
    pub s_frame: FrameDefinition,
    pub g_frame: FrameDefinition,
    pub h_frame: FrameDefinition,
}

impl LogDefinitions {
    fn frame_mut(&mut self, frame_type: &str) -> Option<&mut FrameDefinition> {
        match frame_type {
            "I" => Some(&mut self.i_frame),
            "P" => Some(&mut self.p_frame),
            "S" => Some(&mut self.s_frame),
            "G" => Some(&mut self.g_frame),
            "H" => Some(&mut self.h_frame),
            _ => None,
        }
    }
}

/// Offset where the header block ends: the first line after a newline that
/// does not start with `H`
pub fn header_end(log_data: &[u8]) -> usize {
    for i in 1..log_data.len() {
        if log_data[i - 1] == b'\n' && log_data[i] != b'H' {
            return i;
        }
    }
    log_data.len()
}

/// Parse header text into settings and frame definitions.
///
/// `Field` lines become definitions; every other `H key:value` line lands in
/// the settings map in order of appearance.
pub fn parse_headers_from_text(header_text: &str) -> Result<(HeaderMap, LogDefinitions)> {
    let mut headers = HeaderMap::new();
    let mut defs = LogDefinitions::default();

    for line in header_text.lines() {
        let line = line.trim();
        let Some(body) = line.strip_prefix("H ") else {
            continue;
        };
        let Some((key, value)) = body.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if let Some(field_spec) = key.strip_prefix("Field ") {
            parse_field_line(field_spec, value, &mut defs)?;
        } else if !key.is_empty() {
            headers.insert(key, HeaderValue::parse(value));
        }
    }

    Ok((headers, defs))
}

fn parse_field_line(field_spec: &str, value: &str, defs: &mut LogDefinitions) -> Result<()> {
    let Some((frame_type, attribute)) = field_spec.split_once(' ') else {
        return Ok(());
    };

    // P frames inherit field names from I frames but have their own predictors/encodings
    if frame_type == "P" && defs.p_frame.is_empty() && !defs.i_frame.is_empty() {
        defs.p_frame = FrameDefinition::from_field_names(&defs.i_frame.field_names());
    }

    let Some(def) = defs.frame_mut(frame_type) else {
        return Ok(());
    };

    match attribute.trim() {
        "name" => {
            let names: Vec<&str> = value.split(',').collect();
            *def = FrameDefinition::from_field_names(&names);
        }
        "signed" => {
            let signed: Vec<bool> = value.split(',').map(|s| s.trim() == "1").collect();
            def.update_signed(&signed);
        }
        "predictor" => {
            let predictors = parse_u8_list(value)
                .map_err(|_| anyhow!("Invalid header: invalid {} predictor values", frame_type))?;
            def.update_predictors(&predictors);
        }
        "encoding" => {
            let encodings = parse_u8_list(value)
                .map_err(|_| anyhow!("Invalid header: invalid {} encoding values", frame_type))?;
            def.update_encoding(&encodings);
        }
        _ => {}
    }

    Ok(())
}

fn parse_u8_list(value: &str) -> std::result::Result<Vec<u8>, std::num::ParseIntError> {
    value.split(',').map(|s| s.trim().parse()).collect()
}
