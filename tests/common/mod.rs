#![allow(dead_code)]

//! Synthetic blackbox recordings for integration tests.
//!
//! Every recording declares I-frames only: `loopIteration` and `time` as
//! unsigned VB, the remaining channels as signed VB, all with predictor 0.

pub const MARKER: &str = "H Product:Blackbox flight data recorder by Nicholas Sherlock";

pub const FIELDS: &[&str] = &[
    "loopIteration",
    "time",
    "gyroADC[0]",
    "gyroADC[1]",
    "gyroADC[2]",
    "rcCommand[0]",
    "rcCommand[1]",
    "rcCommand[2]",
    "rcCommand[3]",
    "motor[0]",
    "motor[1]",
    "motor[2]",
    "motor[3]",
    "vbatLatest",
];

pub fn write_unsigned_vb(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub fn write_signed_vb(out: &mut Vec<u8>, value: i32) {
    write_unsigned_vb(out, ((value << 1) ^ (value >> 31)) as u32);
}

/// Builder for one recording
pub struct LogBuilder {
    looptime: u32,
    craft: String,
    extra_headers: Vec<(String, String)>,
    body: Vec<u8>,
    iteration: u32,
}

impl LogBuilder {
    pub fn new(looptime: u32) -> Self {
        Self {
            looptime,
            craft: "test quad".to_string(),
            extra_headers: Vec::new(),
            body: Vec::new(),
            iteration: 0,
        }
    }

    pub fn craft(mut self, craft: &str) -> Self {
        self.craft = craft.to_string();
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.extra_headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Append one I-frame at `time_us`
    pub fn frame(&mut self, time_us: u32, gyro: [i32; 3], motors: [i32; 4]) -> &mut Self {
        self.body.push(b'I');
        write_unsigned_vb(&mut self.body, self.iteration);
        write_unsigned_vb(&mut self.body, time_us);
        for g in gyro {
            write_signed_vb(&mut self.body, g);
        }
        for rc in [10, -20, 5, 1500] {
            write_signed_vb(&mut self.body, rc);
        }
        for m in motors {
            write_signed_vb(&mut self.body, m);
        }
        write_signed_vb(&mut self.body, 1620);
        self.iteration += 1;
        self
    }

    /// `count` frames spaced one looptime apart starting at `start_us`
    pub fn frames(&mut self, start_us: u32, count: u32) -> &mut Self {
        self.frames_spaced(start_us, count, self.looptime)
    }

    pub fn frames_spaced(&mut self, start_us: u32, count: u32, spacing_us: u32) -> &mut Self {
        for i in 0..count {
            let gyro = if i % 2 == 0 { [40, -12, 6] } else { [-40, 12, -6] };
            self.frame(start_us + i * spacing_us, gyro, [1200, 1210, 1190, 1205]);
        }
        self
    }

    /// An event frame of a type no decoder knows
    pub fn unknown_event(&mut self) -> &mut Self {
        self.body.extend_from_slice(&[b'E', 200]);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut line = |text: String| {
            out.extend_from_slice(text.as_bytes());
            out.push(b'\n');
        };

        line(MARKER.to_string());
        line("H Data version:2".to_string());
        line("H I interval:1".to_string());
        line("H P interval:1/1".to_string());
        line(format!("H Field I name:{}", FIELDS.join(",")));
        line(format!("H Field I signed:{}", vec!["0"; FIELDS.len()].join(",")));
        line(format!("H Field I predictor:{}", vec!["0"; FIELDS.len()].join(",")));
        let encodings: Vec<&str> = (0..FIELDS.len())
            .map(|i| if i < 2 { "1" } else { "0" })
            .collect();
        line(format!("H Field I encoding:{}", encodings.join(",")));
        line("H Firmware revision:Betaflight 4.5.1 (77d01ba3b) STM32F7X2".to_string());
        line("H Board information:SPBE SPEEDYBEEF7V3".to_string());
        line(format!("H Craft name:{}", self.craft));
        line(format!("H looptime:{}", self.looptime));
        line("H pid_process_denom:1".to_string());
        line("H rollPID:45,80,30".to_string());
        line("H rates:70,70,65".to_string());
        line("H debug_mode:0".to_string());
        for (key, value) in &self.extra_headers {
            line(format!("H {}:{}", key, value));
        }

        out.extend_from_slice(&self.body);
        out
    }
}

/// A recording of `seconds` of flight at 1 kHz
pub fn recording(seconds: u32, craft: &str) -> Vec<u8> {
    let mut builder = LogBuilder::new(1000).craft(craft);
    builder.frames(1_000_000, seconds * 1000);
    builder.build()
}
