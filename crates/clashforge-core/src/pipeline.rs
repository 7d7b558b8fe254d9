//! Batch conversion: parse → validate → classify → assemble.
//!
//! Each line is processed independently into a [`LineOutcome`], and the
//! outcomes are folded in input order into the endpoint list and a
//! [`ConversionStats`] summary. The document is built only once the fold is
//! complete, and only if at least one endpoint survived.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classifier::{Category, KeywordClassifier};
use crate::config::ConverterConfig;
use crate::document::{default_rules, ClashDocument, ClashProxy};
use crate::error::{ConvertError, ParseError, Result, ValidationError};
use crate::groups::{is_reserved_name, ClassifiedEndpoint, GroupAssembler, MENU_GROUP};
use crate::parser::DescriptorParser;
use crate::validator::{FieldValidator, SidAdjustment};

/// Aggregate counts for one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Lines seen, including ignored ones.
    pub total_lines: usize,
    /// Lines without the descriptor scheme.
    pub ignored: usize,
    /// Lines with the descriptor scheme.
    pub candidates: usize,
    /// Endpoints that made it into the document.
    pub valid: usize,
    /// Candidates that failed to parse.
    pub malformed: usize,
    /// Endpoints rejected by validation.
    pub rejected: usize,
    /// Short ids cut down to the maximum length.
    pub sid_truncated: usize,
    /// Non-hex short ids removed under the sanitize policy.
    pub sid_cleared: usize,
    /// Endpoints renamed because their label collided with a reserved name.
    pub renamed: usize,
    /// Valid endpoints in the origin category.
    pub origin: usize,
    /// Valid endpoints outside the origin category.
    pub foreign: usize,
    /// Valid endpoints matching no category.
    pub uncategorized: usize,
    /// Valid endpoints per category (after suppression).
    pub per_category: BTreeMap<Category, usize>,
}

/// What happened to a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Not a descriptor line.
    Ignored,
    /// Structural parse failure.
    Malformed(ParseError),
    /// Parsed, but failed validation.
    Rejected(ValidationError),
    /// Accepted endpoint, with any normalization applied.
    Accepted(ClassifiedEndpoint, Option<SidAdjustment>),
}

#[derive(Default)]
struct Batch {
    endpoints: Vec<ClassifiedEndpoint>,
    stats: ConversionStats,
}

impl Batch {
    fn absorb(mut self, line_no: usize, outcome: LineOutcome) -> Self {
        let stats = &mut self.stats;
        stats.total_lines += 1;

        match outcome {
            LineOutcome::Ignored => stats.ignored += 1,
            LineOutcome::Malformed(err) => {
                stats.candidates += 1;
                stats.malformed += 1;
                tracing::debug!("line {}: skipped malformed descriptor: {}", line_no, err);
            }
            LineOutcome::Rejected(err) => {
                stats.candidates += 1;
                stats.rejected += 1;
                tracing::warn!("line {}: rejected endpoint: {}", line_no, err);
            }
            LineOutcome::Accepted(mut endpoint, adjustment) => {
                stats.candidates += 1;
                stats.valid += 1;
                match adjustment {
                    Some(SidAdjustment::Truncated { original_len }) => {
                        stats.sid_truncated += 1;
                        tracing::debug!(
                            "line {}: short id truncated from {} characters",
                            line_no,
                            original_len
                        );
                    }
                    Some(SidAdjustment::Cleared) => {
                        stats.sid_cleared += 1;
                        tracing::warn!("line {}: cleared non-hex short id", line_no);
                    }
                    None => {}
                }

                if is_reserved_name(endpoint.name()) {
                    let renamed = format!("{} ({})", endpoint.name(), endpoint.endpoint.authority());
                    tracing::warn!(
                        "line {}: label {:?} is a reserved name, using {:?}",
                        line_no,
                        endpoint.name(),
                        renamed
                    );
                    endpoint.endpoint.display_name = renamed;
                    stats.renamed += 1;
                }

                let classification = &endpoint.classification;
                if classification.is_origin() {
                    stats.origin += 1;
                } else {
                    stats.foreign += 1;
                }
                if classification.is_uncategorized() {
                    stats.uncategorized += 1;
                }
                for category in classification.tags() {
                    *stats.per_category.entry(category).or_insert(0) += 1;
                }

                self.endpoints.push(endpoint);
            }
        }

        self
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The finished document.
    pub document: ClashDocument,
    /// Counts for the run.
    pub stats: ConversionStats,
}

/// Runs the full conversion pipeline.
pub struct Converter {
    config: ConverterConfig,
    parser: DescriptorParser,
    validator: FieldValidator,
    classifier: KeywordClassifier,
}

impl Converter {
    /// Creates a converter for the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            parser: DescriptorParser::new(config.scheme.clone()),
            validator: FieldValidator::new(config.sid_policy),
            classifier: KeywordClassifier::new(),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Processes one raw input line.
    pub fn process_line(&self, line: &str) -> LineOutcome {
        let line = line.trim();
        if !self.parser.accepts(line) {
            return LineOutcome::Ignored;
        }

        let endpoint = match self.parser.parse(line) {
            Ok(endpoint) => endpoint,
            Err(err) => return LineOutcome::Malformed(err),
        };

        match self.validator.validate(endpoint) {
            Ok(validated) => {
                let classification = self.classifier.classify(&validated.endpoint.display_name);
                LineOutcome::Accepted(
                    ClassifiedEndpoint {
                        endpoint: validated.endpoint,
                        classification,
                    },
                    validated.adjustment,
                )
            }
            Err(err) => LineOutcome::Rejected(err),
        }
    }

    /// Converts input lines into a document.
    ///
    /// Returns [`ConvertError::NoValidEndpoints`] if nothing survives.
    pub fn convert<I, S>(&self, lines: I) -> Result<Conversion>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let batch = lines
            .into_iter()
            .enumerate()
            .fold(Batch::default(), |batch, (i, line)| {
                batch.absorb(i + 1, self.process_line(line.as_ref()))
            });

        let Batch { endpoints, stats } = batch;

        tracing::info!(
            "Processed {} lines: {} candidates, {} valid, {} malformed, {} rejected",
            stats.total_lines,
            stats.candidates,
            stats.valid,
            stats.malformed,
            stats.rejected
        );

        if endpoints.is_empty() {
            return Err(ConvertError::NoValidEndpoints(stats));
        }

        tracing::info!(
            "Classified {} origin and {} foreign endpoints ({} uncategorized)",
            stats.origin,
            stats.foreign,
            stats.uncategorized
        );
        for (category, count) in &stats.per_category {
            tracing::debug!("{}: {}", category.name(), count);
        }

        let groups = GroupAssembler::new(&self.config).assemble(&endpoints);
        let proxies = endpoints
            .iter()
            .map(|e| ClashProxy::from_endpoint(&e.endpoint, &self.config.default_fingerprint))
            .collect();
        let rules = default_rules(&GroupAssembler::origin_group_name(), MENU_GROUP);

        Ok(Conversion {
            document: ClashDocument {
                global: self.config.global.clone(),
                proxies,
                proxy_groups: groups,
                rules,
            },
            stats,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}
