//! Minimal protobuf wire-format helpers.
//!
//! Only what the fixed message shapes in this crate need: varints,
//! length-delimited fields and 64-bit fixed fields. Unknown fields are skipped
//! on read so newer chain versions that append fields still decode.

pub(crate) const WIRE_VARINT: u8 = 0;
pub(crate) const WIRE_FIXED64: u8 = 1;
pub(crate) const WIRE_LEN: u8 = 2;
pub(crate) const WIRE_FIXED32: u8 = 5;

/// Cursor over an encoded protobuf message.
pub(crate) struct ProtoReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ProtoReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64, String> {
        let mut value: u64 = 0;
        for shift in (0..64).step_by(7) {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| "Truncated varint".to_string())?;
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err("Varint longer than 10 bytes".to_string())
    }

    /// Read a field key, returning (field number, wire type).
    pub(crate) fn read_key(&mut self) -> Result<(u32, u8), String> {
        let key = self.read_varint()?;
        let field = u32::try_from(key >> 3).map_err(|_| format!("Field number too large: {}", key >> 3))?;
        if field == 0 {
            return Err("Field number 0 is reserved".to_string());
        }
        Ok((field, (key & 0x07) as u8))
    }

    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8], String> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| format!("Length-delimited field of {} bytes overruns buffer", len))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn read_string(&mut self) -> Result<String, String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| format!("Invalid UTF-8 string: {}", e))
    }

    /// Read a varint field that must carry an `int32` enum / value.
    pub(crate) fn read_int32(&mut self) -> Result<i32, String> {
        // int32 negatives are sign-extended to 64 bits on the wire
        Ok(self.read_varint()? as i64 as i32)
    }

    pub(crate) fn expect_wire(field: u32, wire: u8, expected: u8) -> Result<(), String> {
        if wire != expected {
            return Err(format!(
                "Field {} has wire type {}, expected {}",
                field, wire, expected
            ));
        }
        Ok(())
    }

    pub(crate) fn skip(&mut self, wire: u8) -> Result<(), String> {
        match wire {
            WIRE_VARINT => {
                self.read_varint()?;
            }
            WIRE_FIXED64 => self.advance(8)?,
            WIRE_LEN => {
                self.read_bytes()?;
            }
            WIRE_FIXED32 => self.advance(4)?,
            other => return Err(format!("Unsupported wire type {}", other)),
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) -> Result<(), String> {
        if self.pos + n > self.buf.len() {
            return Err(format!("Fixed field of {} bytes overruns buffer", n));
        }
        self.pos += n;
        Ok(())
    }
}

pub(crate) fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub(crate) fn put_key(field: u32, wire: u8, out: &mut Vec<u8>) {
    encode_varint((u64::from(field) << 3) | u64::from(wire), out);
}

/// Varint field, omitted when zero (proto3 default).
pub(crate) fn put_varint(field: u32, value: u64, out: &mut Vec<u8>) {
    if value != 0 {
        put_key(field, WIRE_VARINT, out);
        encode_varint(value, out);
    }
}

/// `sfixed64` field, omitted when zero.
pub(crate) fn put_sfixed64(field: u32, value: i64, out: &mut Vec<u8>) {
    if value != 0 {
        put_key(field, WIRE_FIXED64, out);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Bytes / string / embedded message field, omitted when empty.
pub(crate) fn put_bytes(field: u32, bytes: &[u8], out: &mut Vec<u8>) {
    if !bytes.is_empty() {
        put_message(field, bytes, out);
    }
}

/// Embedded message field that is emitted even when empty (non-nullable).
pub(crate) fn put_message(field: u32, bytes: &[u8], out: &mut Vec<u8>) {
    put_key(field, WIRE_LEN, out);
    encode_varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}
