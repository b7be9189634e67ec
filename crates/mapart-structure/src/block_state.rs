use mapart_common::{MapartError, Result};
use mapart_nbt::Tag;

/// A parsed `namespace:id[prop=value,...]` block state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub name: String,
    pub properties: Vec<(String, String)>,
}

impl BlockState {
    pub fn parse(state: &str) -> Result<Self> {
        let state = state.trim();
        let invalid = |why: &str| MapartError::BlockStateError(format!("{:?}: {}", state, why));

        let (name, properties) = match state.split_once('[') {
            None => (state, None),
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("missing closing ']'"))?;
                (name, Some(inner))
            }
        };
        if name.is_empty() || name.contains(char::is_whitespace) || name.contains(']') {
            return Err(invalid("bad block id"));
        }

        let mut parsed = Vec::new();
        for pair in properties.into_iter().flat_map(|p| p.split(',')) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid("property without '='"))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(invalid("empty property key or value"));
            }
            parsed.push((key.to_owned(), value.to_owned()));
        }

        Ok(BlockState {
            name: name.to_owned(),
            properties: parsed,
        })
    }

    /// Palette entry as stored in structure files.
    pub fn to_tag(&self) -> Tag {
        let mut entries = vec![("Name".to_owned(), Tag::String(self.name.clone()))];
        if !self.properties.is_empty() {
            let properties = self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), Tag::String(v.clone())));
            entries.push(("Properties".to_owned(), Tag::compound(properties)));
        }
        Tag::Compound(entries)
    }
}
