//! FILENAME: cube/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CubeError {
    #[error("malformed cube: {0}")]
    MalformedCube(String),
}
