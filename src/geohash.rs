//! Geohash decoding.

use crate::models::GeoPoint;

const ALPHABET: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest hash the decoder accepts; further characters refine the cell
/// below centimetre scale.
const MAX_PRECISION: usize = 12;

/// Decode a geohash to the center of its cell.
///
/// Case-insensitive. Returns `None` for empty input, characters outside the
/// geohash alphabet, or a cell center that is not a valid coordinate.
/// Hashes longer than 12 characters decode to their 12 character prefix.
pub fn decode(hash: &str) -> Option<GeoPoint> {
    let hash = hash.trim().to_ascii_lowercase();
    if hash.is_empty() || !hash.bytes().all(|b| ALPHABET.contains(&b)) {
        return None;
    }

    let hash = &hash[..hash.len().min(MAX_PRECISION)];
    let (center, _, _) = ::geohash::decode(hash).ok()?;
    let point = GeoPoint::new(center.y, center.x);
    (point.lat.is_finite()
        && point.lon.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lon))
    .then_some(point)
}
