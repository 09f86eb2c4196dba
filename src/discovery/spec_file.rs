use crate::catalog::CapabilitySpec;
use crate::discovery::DiscoveryError;
use crate::schema_loader::SpecSchemas;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read, validate, and parse one spec file exported as `T::KIND`.
///
/// A file whose `spec_type` names a different kind than the export list it
/// came from is rejected before schema validation so the error names the
/// mismatch instead of a generic const violation.
pub fn load_spec<T>(path: &Path, schemas: &SpecSchemas) -> Result<T, DiscoveryError>
where
    T: CapabilitySpec + DeserializeOwned,
{
    let data = fs::read_to_string(path).map_err(|err| DiscoveryError::io(path, err))?;
    let value: Value = serde_json::from_str(&data).map_err(|source| DiscoveryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(found) = value.get("spec_type").and_then(Value::as_str) {
        if found != T::KIND.as_str() {
            return Err(DiscoveryError::SpecType {
                path: path.to_path_buf(),
                expected: T::KIND,
                found: found.to_string(),
            });
        }
    }

    schemas
        .validate_spec(T::KIND, &value)
        .map_err(|details| DiscoveryError::Schema {
            path: path.to_path_buf(),
            details,
        })?;

    serde_json::from_value(value).map_err(|source| DiscoveryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
