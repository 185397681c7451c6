use crate::parser::codec::*;
use anyhow::{bail, Result};

/// Cursor over the binary frame section of one recording
pub struct BBLDataStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BBLDataStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => bail!("unexpected end of frame data at offset {}", self.pos),
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos + count;
        if end > self.data.len() {
            bail!(
                "unexpected end of frame data reading {} bytes at offset {}",
                count,
                self.pos
            );
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_s16_le(&mut self) -> Result<i64> {
        let b = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]) as i64)
    }

    pub fn read_s32_le(&mut self) -> Result<i64> {
        let b = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64)
    }

    /// Unsigned variable-byte integer, 7 bits per byte, little-endian groups
    pub fn read_unsigned_vb(&mut self) -> Result<u32> {
        let mut result = 0u32;

        // 5 bytes is enough to encode 32-bit unsigned quantities
        for i in 0..5 {
            let b = self.read_byte()?;
            result |= ((b & 0x7f) as u32) << (i * 7);
            if b < 0x80 {
                return Ok(result);
            }
        }

        bail!("variable-byte integer too long at offset {}", self.pos)
    }

    /// Zig-zag encoded signed variable-byte integer
    pub fn read_signed_vb(&mut self) -> Result<i64> {
        let unsigned = self.read_unsigned_vb()?;
        Ok(((unsigned >> 1) as i32 ^ -((unsigned & 1) as i32)) as i64)
    }

    pub fn read_neg_14bit(&mut self) -> Result<i64> {
        let word = self.read_unsigned_vb()?;
        Ok(-sign_extend_14bit(word as u16))
    }

    pub fn read_tag8_4s16(&mut self, values: &mut [i64; 8]) -> Result<()> {
        let selector = self.read_byte()?;
        let mut nibble_index = 0;
        let mut buffer = 0u8;

        for (i, value) in values.iter_mut().take(4).enumerate() {
            match (selector >> (i * 2)) & 0x03 {
                0 => *value = 0,
                1 => {
                    if nibble_index == 0 {
                        buffer = self.read_byte()?;
                        *value = sign_extend_4bit(buffer >> 4);
                        nibble_index = 1;
                    } else {
                        *value = sign_extend_4bit(buffer & 0x0f);
                        nibble_index = 0;
                    }
                }
                2 => {
                    if nibble_index == 0 {
                        *value = sign_extend_8bit(self.read_byte()?);
                    } else {
                        let mut byte = (buffer & 0x0f) << 4;
                        buffer = self.read_byte()?;
                        byte |= buffer >> 4;
                        *value = sign_extend_8bit(byte);
                    }
                }
                _ => {
                    if nibble_index == 0 {
                        let hi = self.read_byte()?;
                        let lo = self.read_byte()?;
                        *value = sign_extend_16bit(((hi as u16) << 8) | lo as u16);
                    } else {
                        let b1 = self.read_byte()?;
                        let b2 = self.read_byte()?;
                        *value = sign_extend_16bit(
                            (((buffer & 0x0f) as u16) << 12)
                                | ((b1 as u16) << 4)
                                | ((b2 as u16) >> 4),
                        );
                        buffer = b2;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn read_tag2_3s32(&mut self, values: &mut [i64; 8]) -> Result<()> {
        let lead = self.read_byte()?;

        match lead >> 6 {
            0 => {
                values[0] = sign_extend_2bit((lead >> 4) & 0x03);
                values[1] = sign_extend_2bit((lead >> 2) & 0x03);
                values[2] = sign_extend_2bit(lead & 0x03);
            }
            1 => {
                values[0] = sign_extend_4bit(lead & 0x0f);
                let b = self.read_byte()?;
                values[1] = sign_extend_4bit(b >> 4);
                values[2] = sign_extend_4bit(b & 0x0f);
            }
            2 => {
                values[0] = sign_extend_6bit(lead & 0x3f);
                values[1] = sign_extend_6bit(self.read_byte()? & 0x3f);
                values[2] = sign_extend_6bit(self.read_byte()? & 0x3f);
            }
            _ => self.read_wide_triple(lead, values)?,
        }

        Ok(())
    }

    pub fn read_tag2_3svariable(&mut self, values: &mut [i64; 8]) -> Result<()> {
        let lead = self.read_byte()?;

        match lead >> 6 {
            0 => {
                values[0] = sign_extend_2bit((lead >> 4) & 0x03);
                values[1] = sign_extend_2bit((lead >> 2) & 0x03);
                values[2] = sign_extend_2bit(lead & 0x03);
            }
            1 => {
                // 5 + 5 + 4 bits
                values[0] = sign_extend_5bit((lead & 0x3e) >> 1);
                let b1 = self.read_byte()?;
                values[1] = sign_extend_5bit(((lead & 0x01) << 4) | ((b1 & 0xf0) >> 4));
                values[2] = sign_extend_4bit(b1 & 0x0f);
            }
            2 => {
                // 8 + 7 + 7 bits
                let b1 = self.read_byte()?;
                values[0] = sign_extend_8bit(((lead & 0x3f) << 2) | ((b1 & 0xc0) >> 6));
                let b2 = self.read_byte()?;
                values[1] = sign_extend_7bit(((b1 & 0x3f) << 1) | ((b2 & 0x80) >> 7));
                values[2] = sign_extend_7bit(b2 & 0x7f);
            }
            _ => self.read_wide_triple(lead, values)?,
        }

        Ok(())
    }

    /// 8/16/24/32-bit little-endian fields selected two bits at a time
    fn read_wide_triple(&mut self, lead: u8, values: &mut [i64; 8]) -> Result<()> {
        let mut selector = lead;
        for value in values.iter_mut().take(3) {
            *value = match selector & 0x03 {
                0 => sign_extend_8bit(self.read_byte()?),
                1 => self.read_s16_le()?,
                2 => {
                    let b = self.read_bytes(3)?;
                    sign_extend_24bit(b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16)
                }
                _ => self.read_s32_le()?,
            };
            selector >>= 2;
        }
        Ok(())
    }

    /// Up to eight signed VB values behind a presence bitmap.
    /// A group of one carries no bitmap byte.
    pub fn read_tag8_8svb(&mut self, values: &mut [i64; 8], count: usize) -> Result<()> {
        if count == 1 {
            values[0] = self.read_signed_vb()?;
            return Ok(());
        }

        let mut header = self.read_byte()?;
        for value in values.iter_mut() {
            *value = if header & 0x01 != 0 {
                self.read_signed_vb()?
            } else {
                0
            };
            header >>= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_vb() {
        let mut stream = BBLDataStream::new(&[0x96, 0x01, 0x05]);
        assert_eq!(stream.read_unsigned_vb().unwrap(), 150);
        assert_eq!(stream.read_unsigned_vb().unwrap(), 5);
        assert!(stream.eof());
        assert!(stream.read_unsigned_vb().is_err());
    }

    #[test]
    fn test_signed_vb_zigzag() {
        let mut stream = BBLDataStream::new(&[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(stream.read_signed_vb().unwrap(), 0);
        assert_eq!(stream.read_signed_vb().unwrap(), -1);
        assert_eq!(stream.read_signed_vb().unwrap(), 1);
        assert_eq!(stream.read_signed_vb().unwrap(), -2);
    }

    #[test]
    fn test_tag2_3s32_two_bit_fields() {
        // 00 01 10 11 -> 1, -2, -1
        let mut stream = BBLDataStream::new(&[0b0001_1011]);
        let mut values = [0i64; 8];
        stream.read_tag2_3s32(&mut values).unwrap();
        assert_eq!(&values[..3], &[1, -2, -1]);
    }

    #[test]
    fn test_tag8_4s16_mixed_widths() {
        // selector: field0 = 4bit, field1 = 4bit, field2 = zero, field3 = 8bit
        let selector = 0b10_00_01_01;
        let data = [selector, 0x7f, 0x80];
        let mut stream = BBLDataStream::new(&data);
        let mut values = [0i64; 8];
        stream.read_tag8_4s16(&mut values).unwrap();
        assert_eq!(&values[..4], &[7, -1, 0, -128]);
    }

    #[test]
    fn test_tag8_8svb_single_value_has_no_header() {
        let mut stream = BBLDataStream::new(&[0x04]);
        let mut values = [0i64; 8];
        stream.read_tag8_8svb(&mut values, 1).unwrap();
        assert_eq!(values[0], 2);
        assert!(stream.eof());
    }

    #[test]
    fn test_tag8_8svb_bitmap() {
        let mut stream = BBLDataStream::new(&[0b0000_0101, 0x02, 0x03]);
        let mut values = [9i64; 8];
        stream.read_tag8_8svb(&mut values, 3).unwrap();
        assert_eq!(&values[..3], &[1, 0, -2]);
    }

    #[test]
    fn test_read_bytes_past_end() {
        let mut stream = BBLDataStream::new(&[1, 2]);
        assert!(stream.read_bytes(3).is_err());
        assert_eq!(stream.position(), 0);
    }
}
