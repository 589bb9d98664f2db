//! BIFF8 record stream of Excel 97-2003 workbooks (the `Workbook` stream of an `.xls` file).
//! Records may be split over CONTINUE records; the reader stitches them back together.

use crate::error::ReadError;
use crate::helpers::bytes::to_f64;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u32;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use encoding_rs::Encoding;
use encoding_rs::UTF_16LE;
use thiserror::Error;

const CONTINUE: u16 = 60;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining")]
    NoEnoughDataError(usize),
}

/// Cursor over BIFF8 records.
pub(crate) struct Biff8Reader {
    /// Encoding of 8-bit strings, taken from the CODEPAGE record
    pub(crate) encoding: &'static Encoding,
    buffer: Vec<u8>,
    pointer: usize, // Next record position in buffer
    chunks: Vec<(usize, usize)>, // Current record chunks (start, end)
    index: usize,  // Current chunk index
    offset: usize, // Offset within current chunk
    scratch: Vec<u8>, // Fields split by a CONTINUE boundary
}

impl Biff8Reader {
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: UTF_16LE,
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
            scratch: Vec::new(),
        }
    }

    /// Advances to the next record and returns its type, or `None` at the end of the stream.
    pub(crate) fn next(&mut self) -> Result<Option<u16>, ReadError> {
        if self.pointer + 4 <= self.buffer.len() {
            self.index = 0;
            self.offset = 0;

            let kind = self.get_u16_at(self.pointer)?;
            let size = self.get_u16_at(self.pointer + 2)? as usize;
            let mut lower = self.pointer + 4;
            let mut upper = (lower + size).min(self.buffer.len());
            self.pointer = upper;

            self.chunks.clear();
            self.chunks.push((lower, upper));
            while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
                let size = self.get_u16_at(self.pointer + 2)? as usize;
                lower = self.pointer + 4;
                upper = (lower + size).min(self.buffer.len());
                self.pointer = upper;
                self.chunks.push((lower, upper));
            }

            Ok(Some(kind))
        } else {
            Ok(None)
        }
    }

    /// Moves the cursor to an absolute stream offset (e.g. a BOUNDSHEET8 sheet position).
    pub(crate) fn goto(&mut self, pointer: usize) {
        self.pointer = pointer;
    }

    /// Reads exactly `length` bytes, joining them across CONTINUE boundaries.
    fn read_exact(&mut self, length: usize) -> Result<&[u8], ReadError> {
        let (source, size) = self.read_range(length);
        if size == length {
            return Ok(&self.buffer[source..source + size]);
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.buffer[source..source + size]);
        while self.scratch.len() < length {
            let (source, size) = self.read_range(length - self.scratch.len());
            if size == 0 {
                Err(Biff8Error::NoEnoughDataError(length))?
            }
            self.scratch.extend_from_slice(&self.buffer[source..source + size]);
        }
        Ok(&self.scratch)
    }

    /// Reads up to `length` bytes from the current chunk of the record.
    fn read(&mut self, length: usize) -> (&[u8], usize) {
        let (source, size) = self.read_range(length);
        (&self.buffer[source..source + size], size)
    }

    /// Buffer position and size of the next read within the current chunk.
    fn read_range(&mut self, length: usize) -> (usize, usize) {
        while let Some((lower, upper)) = self.chunks.get(self.index).copied() {
            let source = upper.min(lower + self.offset);
            if source == upper {
                self.index += 1;
                self.offset = 0;
                continue;
            }
            let target = upper.min(source + length);
            if target == upper {
                self.index += 1;
                self.offset = 0;
            } else {
                self.offset += target - source;
            }
            return (source, target - source);
        }
        (0, 0)
    }

    pub(crate) fn skip(&mut self, length: usize) -> Result<(), ReadError> {
        let mut remaining = length;
        while remaining > 0 {
            let (_, size) = self.read(remaining);
            if size == 0 {
                Err(Biff8Error::NoEnoughDataError(length))?;
            }
            remaining -= size;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ReadError> {
        self.read_exact(1).map(|data| data[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ReadError> {
        self.read_exact(2).map(to_u16)
    }

    /// Reads a u16 located `offset` bytes before the end of the current record.
    pub(crate) fn get_u16_back(&self, offset: usize) -> Result<u16, ReadError> {
        let mut offset = offset;
        for (lower, upper) in self.chunks.iter().rev() {
            if *lower + offset <= *upper {
                return self.get_u16_at(*upper - offset);
            } else {
                offset -= *upper - *lower;
            }
        }
        Err(Biff8Error::NoEnoughDataError(2))?
    }

    pub(crate) fn get_u16_at(&self, index: usize) -> Result<u16, ReadError> {
        if index + 2 <= self.buffer.len() {
            Ok(to_u16(&self.buffer[index..index + 2]))
        } else {
            Err(Biff8Error::NoEnoughDataError(2))?
        }
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ReadError> {
        self.read_exact(4).map(to_u32)
    }

    pub(crate) fn read_usize(&mut self) -> Result<usize, ReadError> {
        self.read_exact(4).map(to_usize)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, ReadError> {
        self.read_exact(8).map(to_u64)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, ReadError> {
        self.read_exact(8).map(to_f64)
    }

    /// Reads an RK number, the compressed integer/float encoding of numeric cells.
    pub(crate) fn read_rk_number(&mut self) -> Result<String, ReadError> {
        let value = self.read_u32()?;
        Ok(decode_rk(value))
    }

    /// Reads a ShortXLUnicodeString (1-byte length prefix)
    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, ReadError> {
        let chars = self.read_u8()? as usize;
        self.read_characters(chars)
    }

    /// Reads an XLUnicodeString (2-byte length prefix)
    pub(crate) fn read_xl_unicode_string(&mut self) -> Result<String, ReadError> {
        let chars = self.read_u16()? as usize;
        self.read_characters(chars)
    }

    /// Reads an XLUnicodeRichExtendedString. Formatting runs and phonetic data
    /// follow the characters and are skipped.
    pub(crate) fn read_xl_unicode_rich_extended_string(&mut self) -> Result<String, ReadError> {
        let chars = self.read_u16()? as usize;
        let flag = self.read_u8()?;
        let rich_string_count = if (flag & 0x8) > 0 { // fRichSt
            self.read_u16()? as usize
        } else {
            0
        };
        let phonetic_count = if (flag & 0x4) > 0 { // fExtSt
            self.read_usize()?
        } else {
            0
        };
        let string = self.read_characters_with_flag(chars, flag)?;
        self.skip(4 * rich_string_count)?;
        self.skip(phonetic_count)?;
        Ok(string)
    }

    fn read_characters(&mut self, chars: usize) -> Result<String, ReadError> {
        let flag = self.read_u8()?;
        self.read_characters_with_flag(chars, flag)
    }

    /// Reads `chars` characters; a CONTINUE boundary inside the characters
    /// starts with a fresh encoding flag byte.
    fn read_characters_with_flag(&mut self, chars: usize, flag: u8) -> Result<String, ReadError> {
        let mut content = String::new();
        let mut flag = flag;
        let mut expected = chars;
        loop {
            let actual = self.decode_into(expected, (flag & 0x1) > 0, &mut content);
            if actual >= expected {
                break;
            }
            expected -= actual;
            flag = self.read_u8()?;
        }
        Ok(content)
    }

    fn decode_into(&mut self, chars: usize, is_high_byte: bool, content: &mut String) -> usize {
        let encoding = self.encoding;
        let (bytes, actual) = self.read(Self::chars_to_bytes(is_high_byte, chars));
        if is_high_byte {
            let (string, _) = UTF_16LE.decode_without_bom_handling(bytes);
            content.push_str(&string);
        } else if encoding == UTF_16LE {
            // Compressed characters are the low bytes of UTF-16 code units.
            content.extend(bytes.iter().map(|byte| *byte as char));
        } else {
            let (string, _) = encoding.decode_without_bom_handling(bytes);
            content.push_str(&string);
        }
        Self::bytes_to_chars(is_high_byte, actual)
    }

    #[inline]
    fn chars_to_bytes(is_high_byte: bool, chars: usize) -> usize {
        if is_high_byte { chars << 1 } else { chars }
    }

    #[inline]
    fn bytes_to_chars(is_high_byte: bool, bytes: usize) -> usize {
        if is_high_byte { bytes >> 1 } else { bytes }
    }
}

/// Decodes an RK value: bit 0 scales by 1/100, bit 1 marks a 30-bit integer,
/// otherwise the upper 30 bits are the high bits of an IEEE double.
pub(crate) fn decode_rk(value: u32) -> String {
    let is_percentage = (value & 0x01) != 0;
    let is_integer = (value & 0x02) != 0;

    let mut number = if is_integer {
        ((value as i32) >> 2) as f64
    } else {
        f64::from_bits(((value >> 2) as u64) << 34)
    };
    if is_percentage {
        number /= 100.0;
    }
    if number.fract() == 0.0 && number.abs() < 1e15 {
        (number as i64).to_string()
    } else {
        number.to_string()
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = kind.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn decodes_rk_integers_and_floats() {
        assert_eq!(decode_rk((123456 << 2) | 0x02), "123456");
        assert_eq!(decode_rk((12345 << 2) | 0x03), "123.45");
        let bits = (1.5f64.to_bits() >> 34) as u32;
        assert_eq!(decode_rk(bits << 2), "1.5");
    }

    #[test]
    fn joins_continue_records() {
        let mut data = record(0x0204, &[1, 2]);
        data.extend(record(CONTINUE, &[3, 4, 5]));
        let mut reader = Biff8Reader::new(data);
        assert_eq!(reader.next().unwrap(), Some(0x0204));
        assert_eq!(reader.read_u32().unwrap(), u32::from_le_bytes([1, 2, 3, 4]));
        assert_eq!(reader.read_u8().unwrap(), 5);
        assert!(reader.read_u8().is_err());
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn fields_span_empty_continue_records() {
        let mut data = record(0x0204, &[0x34]);
        data.extend(record(CONTINUE, &[]));
        data.extend(record(CONTINUE, &[0x12]));
        let mut reader = Biff8Reader::new(data);
        reader.next().unwrap();
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn continued_string_restarts_with_flag() {
        // "ОС" wide, then "ФР" compressed after the boundary in windows-1251
        let mut payload = vec![4u8, 0, 1];
        for unit in "ОС".encode_utf16() {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        let mut data = record(0x0204, &payload);
        data.extend(record(CONTINUE, &[0, 0xD4, 0xD0]));
        let mut reader = Biff8Reader::new(data);
        reader.encoding = encoding_rs::WINDOWS_1251;
        reader.next().unwrap();
        assert_eq!(reader.read_xl_unicode_string().unwrap(), "ОСФР");
    }

    #[test]
    fn reads_wide_and_compressed_strings() {
        let mut payload = vec![3u8, 0, 1];
        for unit in "ОСФ".encode_utf16() {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        payload.extend_from_slice(&[2, 0, 0, b'o', b'k']);
        let mut reader = Biff8Reader::new(record(0x0204, &payload));
        reader.next().unwrap();
        assert_eq!(reader.read_xl_unicode_string().unwrap(), "ОСФ");
        assert_eq!(reader.read_xl_unicode_string().unwrap(), "ok");
    }

    #[test]
    fn compressed_strings_follow_legacy_code_page() {
        // "Дом" in windows-1251
        let payload = [3u8, 0, 0, 0xC4, 0xEE, 0xEC];
        let mut reader = Biff8Reader::new(record(0x0204, &payload));
        reader.encoding = encoding_rs::WINDOWS_1251;
        reader.next().unwrap();
        assert_eq!(reader.read_xl_unicode_string().unwrap(), "Дом");
    }

    #[test]
    fn reading_past_record_fails() {
        let mut reader = Biff8Reader::new(record(0x0204, &[1]));
        reader.next().unwrap();
        assert!(reader.read_u16().is_err());
    }
}
