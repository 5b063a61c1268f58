use crate::error::{StudyError, StudyResult};
use std::path::Path;

/// Generation parameters decoded from a candidate file name.
///
/// `"6,35,600.png"` and `"6,35,600_b.png"` both decode to `[6, 35, 600]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    name: String,
    values: Vec<i64>,
}

impl Identifier {
    /// Decodes the stem of `path`, requiring exactly `arity` fields.
    pub fn from_path(path: &Path, arity: usize) -> StudyResult<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StudyError::malformed(path.display().to_string(), "no file name"))?;
        Self::parse(stem, arity)
    }

    /// Decodes a bare stem such as `"6,35,600"`.
    pub fn parse(stem: &str, arity: usize) -> StudyResult<Self> {
        let body = stem.split('_').next().unwrap_or_default();

        let values = body
            .split(',')
            .map(|field| {
                field.trim().parse::<i64>().map_err(|_| {
                    StudyError::malformed(stem, format!("'{}' is not an integer", field.trim()))
                })
            })
            .collect::<StudyResult<Vec<_>>>()?;

        if values.len() != arity {
            return Err(StudyError::malformed(
                stem,
                format!("expected {} numbers, found {}", arity, values.len()),
            ));
        }

        Ok(Self {
            name: stem.to_string(),
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_three_fields() {
        let id = Identifier::parse("6,35,600", 3).unwrap();
        assert_eq!(id.values(), &[6, 35, 600]);
        assert_eq!(id.arity(), 3);
    }

    #[test]
    fn test_suffix_is_ignored() {
        let id = Identifier::from_path(&PathBuf::from("pool/4,30,550_seed2.png"), 3).unwrap();
        assert_eq!(id.values(), &[4, 30, 550]);
        assert_eq!(id.name(), "4,30,550_seed2");
    }

    #[test]
    fn test_four_field_scheme() {
        let id = Identifier::from_path(&PathBuf::from("out/1,2,3,4.jpg"), 4).unwrap();
        assert_eq!(id.values(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let err = Identifier::parse("1,2,3,4", 3).unwrap_err();
        assert!(matches!(err, StudyError::MalformedIdentifier { .. }));
        assert!(err.to_string().contains("expected 3 numbers, found 4"));
    }

    #[test]
    fn test_non_integer_is_rejected() {
        assert!(Identifier::parse("6,abc,600", 3).is_err());
        assert!(Identifier::parse("groundtruth", 3).is_err());
        assert!(Identifier::parse("", 3).is_err());
    }

    #[test]
    fn test_negative_and_padded_fields() {
        let id = Identifier::parse("-2, 7 ,9", 3).unwrap();
        assert_eq!(id.values(), &[-2, 7, 9]);
    }
}
