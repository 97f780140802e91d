//! Typed values for the free-form parameters passed through to the Epidata API (e.g. `issues`,
//! `lag`, `auth`) alongside the main location parameter.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{FluviewError, FluviewResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Serialized form sent on the wire. Lists become a single comma delimited string.
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Integer(value) => value.to_string(),
            ParamValue::Text(value) => value.clone(),
            ParamValue::List(values) => values.iter().join(","),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_value())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        ParamValue::List(value.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        ParamValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Additional named parameters for a request. Ordered so that built queries are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraArgs(BTreeMap<String, ParamValue>);

impl ExtraArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert, e.g. `ExtraArgs::new().with("regions", vec!["nat", "CA"])`.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(name.to_string(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, ParamValue)> for ExtraArgs {
    fn from_iter<T: IntoIterator<Item = (String, ParamValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ExtraArgs {
    type Item = (String, ParamValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A single `KEY=VALUE` pair as given on the command line. Values containing commas are read as
/// lists and whole numbers as integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamPair(pub String, pub ParamValue);

impl FromStr for ParamPair {
    type Err = FluviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| FluviewError::InvalidParameter(format!("expected KEY=VALUE: {s}")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(FluviewError::InvalidParameter(format!("empty name in: {s}")));
        }
        Ok(Self(key.to_string(), parse_param_value(value)))
    }
}

fn parse_param_value(value: &str) -> ParamValue {
    let value = value.trim();
    if value.contains(',') {
        ParamValue::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    } else if let Ok(n) = value.parse::<i64>() {
        ParamValue::Integer(n)
    } else {
        ParamValue::Text(value.to_string())
    }
}

pub fn extra_args_from_pairs(pairs: Vec<ParamPair>) -> FluviewResult<ExtraArgs> {
    let mut args = ExtraArgs::new();
    for ParamPair(key, value) in pairs {
        if args.insert(&key, value).is_some() {
            return Err(FluviewError::InvalidParameter(format!(
                "parameter given more than once: {key}"
            )));
        }
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_should_serialize_comma_delimited() {
        let value = ParamValue::from(vec!["nat", "CA"]);
        assert_eq!(value.to_query_value(), "nat,CA");
        assert_eq!(ParamValue::from(4_i64).to_query_value(), "4");
        assert_eq!(ParamValue::from("hhs1").to_query_value(), "hhs1");
    }

    #[test]
    fn param_pair_should_parse() {
        assert_eq!(
            "regions=nat,CA".parse::<ParamPair>().unwrap(),
            ParamPair("regions".into(), ParamValue::from(vec!["nat", "CA"]))
        );
        assert_eq!(
            "lag=2".parse::<ParamPair>().unwrap(),
            ParamPair("lag".into(), ParamValue::Integer(2))
        );
        assert_eq!(
            "issues=202001-202010".parse::<ParamPair>().unwrap(),
            ParamPair("issues".into(), ParamValue::from("202001-202010"))
        );
        assert!("lag".parse::<ParamPair>().is_err());
        assert!("=2".parse::<ParamPair>().is_err());
    }

    #[test]
    fn repeated_pairs_should_be_rejected() {
        let pairs = vec![
            "lag=1".parse::<ParamPair>().unwrap(),
            "lag=2".parse::<ParamPair>().unwrap(),
        ];
        assert!(matches!(
            extra_args_from_pairs(pairs),
            Err(FluviewError::InvalidParameter(_))
        ));
    }
}
