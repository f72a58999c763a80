use crate::{Error, ModelError, Result};

/// One `name` or `name(arg, ..)` clause of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub args: Vec<String>,
}

/// Parsed annotation attached to a field: `name(id);ai;len(20)`.
///
/// Clauses keep the order they were first declared in. A property declared twice
/// replaces the arguments of the first declaration instead of adding a new entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tag {
    properties: Vec<Property>,
}

impl Tag {
    /// Parse a whole annotation string, the empty string yields an empty tag.
    pub fn parse(tag: &str) -> Result<Tag> {
        let mut result = Tag::default();
        let clauses =
            split_top_level(tag, ';').map_err(|(start, end)| malformed(&tag[start..end]))?;
        for clause in clauses {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let property = parse_clause(clause)?;
            result.insert(property);
        }
        Ok(result)
    }

    fn insert(&mut self, property: Property) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == property.name) {
            existing.args = property.args;
        } else {
            self.properties.push(property);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.args.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl IntoIterator for Tag {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

fn malformed(clause: &str) -> Error {
    ModelError::MalformedTag {
        clause: clause.to_string(),
    }
    .into()
}

fn parse_clause(clause: &str) -> Result<Property> {
    let Some(open) = clause.find('(') else {
        if clause.contains(')') || !is_name(clause) {
            return Err(malformed(clause));
        }
        return Ok(Property {
            name: clause.to_string(),
            args: Vec::new(),
        });
    };
    let name = clause[..open].trim();
    if !is_name(name) || !clause.ends_with(')') {
        return Err(malformed(clause));
    }
    let inner = &clause[open + 1..clause.len() - 1];
    let args = split_top_level(inner, ',').map_err(|_| malformed(clause))?;
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        args.into_iter().map(|v| v.trim().to_string()).collect()
    };
    Ok(Property {
        name: name.to_string(),
        args,
    })
}

fn is_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Split on `separator` outside of parentheses and single quoted literals.
///
/// Fails when the parentheses are unbalanced or a literal is left open, the error
/// is the byte range of the offending segment.
fn split_top_level(
    value: &str,
    separator: char,
) -> std::result::Result<Vec<&str>, (usize, usize)> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            _ if quoted => {}
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    let end = value[i..]
                        .find(separator)
                        .map_or(value.len(), |v| i + v);
                    (start, end)
                })?
            }
            c if c == separator && depth == 0 => {
                result.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 || quoted {
        return Err((start, value.len()));
    }
    result.push(&value[start..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        assert_eq!(split_top_level("a;b(c;d);e", ';'), Ok(vec!["a", "b(c;d)", "e"]));
        assert_eq!(split_top_level("a,'x,y'", ','), Ok(vec!["a", "'x,y'"]));
        assert_eq!(split_top_level("a;b(c", ';'), Err((2, 5)));
        assert_eq!(split_top_level("a;b)c;d", ';'), Err((2, 5)));
        assert_eq!(split_top_level("'open", ';'), Err((0, 5)));
    }
}
