//! Text frames published once per tick.
//!
//! Every boid is rendered as `x;y;vx;vy;` with six decimal places and the
//! boids are concatenated in flock order. There is no header, so readers
//! parse the fields four at a time.

use thiserror::Error;

use crate::boids::Boid;

pub const FIELDS_PER_BOID: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("frame has {0} fields, not a multiple of 4")]
    FieldCount(usize),

    #[error("field {index} is not a number: {field:?}")]
    BadField { index: usize, field: String },

    #[error("frame does not end with a separator")]
    Unterminated,
}

pub fn encode_frame(boids: &[Boid]) -> String {
    // "-10.000000;" is the widest field at the default margin.
    let mut frame = String::with_capacity(boids.len() * FIELDS_PER_BOID * 11);
    for boid in boids {
        for value in [
            boid.position.x,
            boid.position.y,
            boid.velocity.x,
            boid.velocity.y,
        ] {
            frame.push_str(&format!("{value:.6};"));
        }
    }
    frame
}

pub fn decode_frame(frame: &str) -> Result<Vec<Boid>, WireError> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }
    let body = frame.strip_suffix(';').ok_or(WireError::Unterminated)?;
    let fields = body
        .split(';')
        .enumerate()
        .map(|(index, field)| {
            field.parse::<f32>().map_err(|_| WireError::BadField {
                index,
                field: field.to_string(),
            })
        })
        .collect::<Result<Vec<f32>, _>>()?;
    if fields.len() % FIELDS_PER_BOID != 0 {
        return Err(WireError::FieldCount(fields.len()));
    }
    Ok(fields
        .chunks_exact(FIELDS_PER_BOID)
        .map(|f| Boid::new(f[0], f[1], f[2], f[3]))
        .collect())
}
