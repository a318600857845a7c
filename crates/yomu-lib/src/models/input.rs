use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Descriptor for a filter or a preference. The host renders it and sends it back
/// with `state` filled in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum Input {
    Text {
        name: String,
        state: Option<String>,
    },
    Checkbox {
        name: String,
        state: Option<bool>,
    },
    Select {
        name: String,
        values: Vec<String>,
        state: Option<i64>,
    },
}

impl Input {
    pub fn name(&self) -> &str {
        match self {
            Input::Text { name, .. }
            | Input::Checkbox { name, .. }
            | Input::Select { name, .. } => name,
        }
    }

    pub fn text(&self) -> Result<Option<&str>, Error> {
        match self {
            Input::Text { state, .. } => Ok(state.as_deref()),
            _ => Err(self.mismatch("text")),
        }
    }

    pub fn checked(&self) -> Result<Option<bool>, Error> {
        match self {
            Input::Checkbox { state, .. } => Ok(*state),
            _ => Err(self.mismatch("checkbox")),
        }
    }

    /// Index of the selected value of a `Select`, if it is in range.
    pub fn selected_index(&self) -> Result<Option<usize>, Error> {
        match self {
            Input::Select { values, state, .. } => Ok(state
                .and_then(|i| usize::try_from(i).ok())
                .filter(|i| *i < values.len())),
            _ => Err(self.mismatch("select")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::InvalidInputState {
            name: self.name().to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_selected_index_out_of_range() {
        let input = Input::Select {
            name: "sort".to_string(),
            values: vec!["a".into(), "b".into()],
            state: Some(5),
        };
        assert_eq!(input.selected_index(), Ok(None));

        let input = Input::Select {
            name: "sort".to_string(),
            values: vec!["a".into(), "b".into()],
            state: Some(1),
        };
        assert_eq!(input.selected_index(), Ok(Some(1)));
    }

    #[test]
    fn test_state_type_mismatch() {
        let input = Input::Checkbox {
            name: "webp".to_string(),
            state: Some(true),
        };
        assert_eq!(
            input.text(),
            Err(Error::InvalidInputState {
                name: "webp".to_string(),
                expected: "text"
            })
        );
        assert_eq!(input.checked(), Ok(Some(true)));
    }

    #[test]
    fn test_input_json_shape() {
        let inputs: Vec<Input> = serde_json::from_str(
            r#"[{"type":"Text","name":"username","state":"alice"},
                {"type":"Select","name":"quality","values":["800","1200"],"state":1}]"#,
        )
        .unwrap();

        assert_eq!(inputs[0].name(), "username");
        assert_eq!(inputs[0].text(), Ok(Some("alice")));
        assert_eq!(inputs[1].selected_index(), Ok(Some(1)));
        assert!(inputs[1].text().is_err());
    }
}
