//! Categorical encoding

use crate::error::{PredictorError, Result};
use crate::utils::string_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Type of categorical encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncoderType {
    /// One indicator column per category
    OneHot,
    /// A single column holding the category's index in the sorted vocabulary
    Ordinal,
}

/// Handling of categories that were not present at fit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// Encode as the reference category (all indicators zero; ordinal -1)
    Ignore,
    /// Fail the transform with `UnseenCategory`
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Vocabulary {
    column: String,
    /// Sorted categories seen during fit
    categories: Vec<String>,
}

/// Categorical encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    drop_first: bool,
    unknown: UnknownCategoryPolicy,
    vocabularies: Vec<Vocabulary>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            drop_first: true,
            unknown: UnknownCategoryPolicy::Ignore,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }

    pub fn with_unknown_policy(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// Learn the sorted vocabulary of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.vocabularies.clear();
        for col_name in columns {
            let categories: BTreeSet<String> = string_values(df, col_name)?.into_iter().flatten().collect();
            self.vocabularies.push(Vocabulary {
                column: col_name.to_string(),
                categories: categories.into_iter().collect(),
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column by its encoded columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PredictorError::ModelNotFitted);
        }

        let mut result = df.clone();
        for vocab in &self.vocabularies {
            let values = string_values(df, &vocab.column)?;
            let codes = values
                .iter()
                .map(|v| self.code_of(vocab, v.as_deref()))
                .collect::<Result<Vec<Option<usize>>>>()?;

            result = result.drop(&vocab.column)?;
            match self.encoder_type {
                EncoderType::OneHot => {
                    for (idx, category) in self.kept_categories(vocab) {
                        let indicator: Vec<f64> = codes
                            .iter()
                            .map(|code| if *code == Some(idx) { 1.0 } else { 0.0 })
                            .collect();
                        let name = indicator_name(&vocab.column, category);
                        result.with_column(Series::new(name.into(), indicator))?;
                    }
                }
                EncoderType::Ordinal => {
                    let ordinal: Vec<f64> = codes
                        .iter()
                        .map(|code| code.map_or(-1.0, |c| c as f64))
                        .collect();
                    result.with_column(Series::new(vocab.column.as_str().into(), ordinal))?;
                }
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Names of the columns `transform` produces, in order
    pub fn output_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|vocab| match self.encoder_type {
                EncoderType::OneHot => self
                    .kept_categories(vocab)
                    .map(|(_, category)| indicator_name(&vocab.column, category))
                    .collect::<Vec<_>>(),
                EncoderType::Ordinal => vec![vocab.column.clone()],
            })
            .collect()
    }

    /// Sorted vocabulary of a fitted column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }

    fn kept_categories<'a>(&self, vocab: &'a Vocabulary) -> impl Iterator<Item = (usize, &'a String)> {
        let skip = usize::from(self.drop_first);
        vocab.categories.iter().enumerate().skip(skip)
    }

    fn code_of(&self, vocab: &Vocabulary, value: Option<&str>) -> Result<Option<usize>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match vocab.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => Ok(Some(idx)),
            Err(_) => match self.unknown {
                UnknownCategoryPolicy::Ignore => Ok(None),
                UnknownCategoryPolicy::Error => Err(PredictorError::UnseenCategory {
                    column: vocab.column.clone(),
                    value: value.to_string(),
                }),
            },
        }
    }
}

fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}
