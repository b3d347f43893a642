use quadrosol_types::{Circle, Point, Rect};

use crate::DispatchError;

/// Width in bytes of a single ABI word. Every scalar (integer, coordinate, radius) is encoded as
/// one word, matching the EVM calldata convention the precompile's callers speak.
pub const WORD: usize = 32;

/// Encodes a signed integer as a big-endian two's-complement 256-bit word.
///
/// Internally this precompile represents every ABI integer as `i128`: ids, coordinates, and
/// counts never need the full 256-bit range, and committing to `i128` avoids pulling in
/// arbitrary-precision arithmetic for values that never approach it.
pub fn encode_int(value: i128) -> [u8; WORD] {
    let mut out = if value < 0 { [0xffu8; WORD] } else { [0u8; WORD] };

    out[16..32].copy_from_slice(&value.to_be_bytes());

    out
}

/// Decodes a big-endian two's-complement 256-bit word into an `i128`.
///
/// Errors if the high 16 bytes are not a valid sign-extension of the low 16 (i.e. the value does
/// not fit in `i128`).
pub fn decode_int(word: &[u8]) -> Result<i128, DispatchError> {
    if word.len() != WORD {
        return Err(DispatchError::Decode(anyhow::anyhow!(
            "expected a {WORD}-byte word, got {}",
            word.len()
        )));
    }

    let low: [u8; 16] = word[16..32].try_into().unwrap();
    let value = i128::from_be_bytes(low);
    let expected_sign_byte = if value < 0 { 0xff } else { 0x00 };

    if word[0..16].iter().any(|b| *b != expected_sign_byte) {
        return Err(DispatchError::Decode(anyhow::anyhow!(
            "int256 value does not fit in i128"
        )));
    }

    Ok(value)
}

/// Reads sequential fixed-width fields out of a request payload, surfacing short reads as
/// [`DispatchError::Decode`].
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Wraps a payload for sequential decoding.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Reads the next 32-byte word as a signed integer.
    pub fn read_int(&mut self) -> Result<i128, DispatchError> {
        let word = self.take(WORD)?;

        decode_int(word)
    }

    /// Reads the next 32-byte word as a non-negative handle id.
    pub fn read_id(&mut self) -> Result<u64, DispatchError> {
        let value = self.read_int()?;

        u64::try_from(value)
            .map_err(|_| DispatchError::Decode(anyhow::anyhow!("id {value} is not a valid u64")))
    }

    /// Reads a `Point` as two sequential 32-bit-ranged words.
    pub fn read_point(&mut self) -> Result<Point, DispatchError> {
        let x = self.read_coordinate()?;
        let y = self.read_coordinate()?;

        Ok(Point::new(x, y))
    }

    /// Reads a `Rect` as a min point followed by a max point.
    pub fn read_rect(&mut self) -> Result<Rect, DispatchError> {
        let min = self.read_point()?;
        let max = self.read_point()?;

        Ok(Rect::from_corners(min, max))
    }

    /// Reads a `Circle` as a center point followed by a radius.
    pub fn read_circle(&mut self) -> Result<Circle, DispatchError> {
        let center = self.read_point()?;
        let r = self.read_int()?;
        let r = i64::try_from(r)
            .map_err(|_| DispatchError::Decode(anyhow::anyhow!("radius {r} out of i64 range")))?;

        Ok(Circle::new(center, r))
    }

    fn read_coordinate(&mut self) -> Result<i32, DispatchError> {
        let value = self.read_int()?;

        i32::try_from(value)
            .map_err(|_| DispatchError::Decode(anyhow::anyhow!("coordinate {value} out of i32 range")))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DispatchError> {
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| DispatchError::Decode(anyhow::anyhow!("unexpected end of payload")))?;

        self.offset = end;

        Ok(slice)
    }
}

/// Appends `value` to `out` as a 32-byte word.
pub fn write_int(out: &mut Vec<u8>, value: i128) {
    out.extend_from_slice(&encode_int(value));
}

/// Appends a point to `out` as two sequential words.
pub fn write_point(out: &mut Vec<u8>, point: Point) {
    write_int(out, i128::from(point.x));
    write_int(out, i128::from(point.y));
}

/// Appends a rect to `out` as a min point followed by a max point.
pub fn write_rect(out: &mut Vec<u8>, rect: Rect) {
    write_point(out, rect.min);
    write_point(out, rect.max);
}

/// Appends a length-prefixed array of points to `out`.
pub fn write_points(out: &mut Vec<u8>, points: &[Point]) {
    write_int(out, points.len() as i128);

    for point in points {
        write_point(out, *point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips_across_the_i128_range() {
        for v in [0i128, 1, -1, i128::MAX, i128::MIN, 1_000_000, -1_000_000] {
            let encoded = encode_int(v);

            assert_eq!(decode_int(&encoded).unwrap(), v);
        }
    }

    #[test]
    fn cursor_reads_id_then_point() {
        let mut payload = Vec::new();

        write_int(&mut payload, 7);
        write_point(&mut payload, Point::new(-4, 9));

        let mut cursor = Cursor::new(&payload);

        assert_eq!(cursor.read_id().unwrap(), 7);
        assert_eq!(cursor.read_point().unwrap(), Point::new(-4, 9));
    }

    #[test]
    fn short_payload_is_a_decode_error() {
        let mut cursor = Cursor::new(&[0u8; 10]);

        assert!(matches!(cursor.read_int(), Err(DispatchError::Decode(_))));
    }
}
