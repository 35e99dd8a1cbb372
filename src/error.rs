// Copyright (c) 2025  Energy aware production data authors

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/*!
Errores de la biblioteca
========================

Error taxonomy of the instance pipeline.

- `MalformedInput` and `Parse`: the raw text of one instance can't be read
- `MissingGroundTruth`: the instance key has no best known makespan
- `SchemaViolation`: an assembled or deserialized record breaks the structural invariants
- `CorpusInvariantViolation`: more running machines than available ones (aborts a whole pass)
- `InvalidParameter` and `UnknownAmplifier`: configuration errors
*/

use std::fmt;

/// Errores de la biblioteca
///
/// Library errors
#[derive(Debug, Clone, PartialEq)]
pub enum EapError {
    /// Wrong header, wrong matrix shape or a value out of its domain
    MalformedInput(String),
    /// A token couldn't be parsed as a number
    Parse {
        /// Source text
        from: String,
        /// Target type
        into: String,
        /// Description
        desc: &'static str,
    },
    /// Instance key (jobs, stages, id) not present in the makespan table
    MissingGroundTruth(String),
    /// Record breaks a structural invariant
    SchemaViolation(String),
    /// Average running machines above the number of available machines
    CorpusInvariantViolation {
        /// Instance file or identifier
        instance: String,
        /// Total processing time / best known makespan
        average_running_machines: f64,
        /// Machines across all stages
        number_of_available_machines: usize,
    },
    /// Configuration value out of its domain
    InvalidParameter(String),
    /// Velocity key not present in the amplifier table
    UnknownAmplifier(String),
}

impl EapError {
    /// Errors caused by the input data of a single instance
    pub fn is_input_error(&self) -> bool {
        match self {
            EapError::MalformedInput(_) | EapError::Parse { .. } | EapError::MissingGroundTruth(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EapError::*;
        match self {
            MalformedInput(desc) => write!(f, "Malformed input: {}", desc),
            Parse { from, into, desc } => {
                write!(f, "Could not parse {} from \"{}\" ({})", into, from, desc)
            }
            MissingGroundTruth(key) => {
                write!(f, "Best known makespan not found for instance {}", key)
            }
            SchemaViolation(desc) => write!(f, "Schema violation: {}", desc),
            CorpusInvariantViolation {
                instance,
                average_running_machines,
                number_of_available_machines,
            } => write!(
                f,
                "Instance {}: average running machines ({:.3}) exceed the available machines ({})",
                instance, average_running_machines, number_of_available_machines
            ),
            InvalidParameter(desc) => write!(f, "Invalid parameter: {}", desc),
            UnknownAmplifier(key) => write!(f, "No amplifier defined for velocity \"{}\"", key),
        }
    }
}

impl std::error::Error for EapError {}

impl From<std::num::ParseIntError> for EapError {
    fn from(err: std::num::ParseIntError) -> Self {
        EapError::Parse {
            from: err.to_string(),
            into: "Integer".into(),
            desc: "wrong integer format",
        }
    }
}

impl From<std::num::ParseFloatError> for EapError {
    fn from(err: std::num::ParseFloatError) -> Self {
        EapError::Parse {
            from: err.to_string(),
            into: "Number".into(),
            desc: "wrong number format",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn corpus_violation_message_names_both_values() {
        let err = EapError::CorpusInvariantViolation {
            instance: "20_5_1".into(),
            average_running_machines: 5.0,
            number_of_available_machines: 4,
        };
        assert_eq!(
            err.to_string(),
            "Instance 20_5_1: average running machines (5.000) exceed the available machines (4)"
        );
        assert!(!err.is_input_error());
    }

    #[test]
    fn parse_errors_are_input_errors() {
        let err: EapError = "x1".parse::<u64>().unwrap_err().into();
        assert!(err.is_input_error());
    }
}
