//! Image reference and command arguments following the last flag.

use recompose_common::error::{RecomposeError, Result};

/// Line-continuation token left in place by a multi-line invocation.
const CONTINUATION: &str = "\\";

/// The image and the command to run in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailing {
    /// Image reference as written.
    pub image: String,
    /// Arguments after the image, in order.
    pub command: Vec<String>,
}

/// Splits the tokens left after flag parsing into image and command.
///
/// # Errors
///
/// Returns [`RecomposeError::MissingImage`] if no token is left.
pub fn resolve(tokens: Vec<String>) -> Result<Trailing> {
    let mut words = tokens.into_iter().filter(|token| token != CONTINUATION);
    let image = words.next().ok_or(RecomposeError::MissingImage)?;
    Ok(Trailing {
        image,
        command: words.collect(),
    })
}

/// Derives a service name from an image reference.
///
/// `registry.example.com:5000/team/web:1.2` becomes `web`. Digests are
/// dropped as well. If nothing is left the reference is used unchanged.
pub fn service_name(image: &str) -> String {
    let name = image.rsplit('/').next().unwrap_or(image);
    let name = name.split('@').next().unwrap_or(name);
    let name = name.split(':').next().unwrap_or(name);
    if name.is_empty() {
        image.to_owned()
    } else {
        name.to_owned()
    }
}
