//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::PathBuf;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot determine the software root directory: {0}")]
    SwRootNotFound(std::io::Error),

    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the full path of a parameter file, relative to the "params" directory under the software
/// root.
pub fn param_path(param_file_path: &str) -> Result<PathBuf, LoadError> {
    let mut path = crate::host::get_sw_root().map_err(LoadError::SwRootNotFound)?;
    path.push("params");
    path.push(param_file_path);
    Ok(path)
}

/// Load a parameter file
///
/// The file path is relative to the "params" directory under the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let path = param_path(param_file_path)?;

    // Load the file into a string
    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e)),
    };

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Motors {
        forward_power: i32,
        turn_power: i32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Rig {
        endpoint: String,
        motors: Motors,
    }

    #[test]
    fn test_from_str() -> Result<(), LoadError> {
        let rig: Rig = from_str(
            r#"
            endpoint = "tcp://localhost:5020"

            [motors]
            forward_power = 15
            turn_power = 10
            "#,
        )?;

        assert_eq!(rig.endpoint, "tcp://localhost:5020");
        assert_eq!(
            rig.motors,
            Motors {
                forward_power: 15,
                turn_power: 10
            }
        );

        Ok(())
    }

    #[test]
    fn test_from_str_missing_field() {
        let res: Result<Rig, _> = from_str("endpoint = \"tcp://localhost:5020\"");
        assert!(matches!(res, Err(LoadError::DeserialiseError(_))));
    }
}
