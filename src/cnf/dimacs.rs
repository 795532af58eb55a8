use std::path::Path;

use thiserror::Error;

use super::cnf::Cnf;

/// Errors raised while reading DIMACS CNF input. Parsing never aborts the
/// process; malformed input surfaces here.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing DIMACS header, expected `p cnf <vars> <clauses>`")]
    MissingHeader,
    #[error("invalid DIMACS header `{0}`, expected `p cnf <vars> <clauses>`")]
    InvalidHeader(String),
    #[error("invalid literal `{token}` on line {line}")]
    InvalidLiteral { token: String, line: usize },
    #[error("literal {lit} on line {line} is out of range for {num_vars} variables")]
    LiteralOutOfRange {
        lit: i32,
        line: usize,
        num_vars: usize,
    },
    #[error("clause on line {line} is not terminated by 0")]
    MissingTerminator { line: usize },
    #[error("unexpected tokens after clause terminator on line {line}")]
    TrailingTokens { line: usize },
    #[error("header declared {expected} clauses but only {found} were present")]
    TooFewClauses { expected: usize, found: usize },
    #[error("invalid witness token `{0}`, expected 0 or 1")]
    WitnessToken(String),
    #[error("witness has {found} values but the formula has {expected} variables")]
    WitnessLength { found: usize, expected: usize },
}

/// Parses DIMACS CNF text. Comment lines start with `c`; the first non-comment
/// line must be the `p cnf` header; each clause is one line of signed integers
/// terminated by `0`. Reading stops once the declared clause count is consumed.
pub fn parse_dimacs(input: &str) -> Result<Cnf, FormatError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('c'));

    let (_, header) = lines.next().ok_or(FormatError::MissingHeader)?;
    let (num_vars, num_clauses) = parse_header(header)?;

    let mut cnf = Cnf::new(num_vars);
    for (line_no, line) in lines {
        if cnf.clauses.len() == num_clauses {
            break;
        }
        cnf.add_clause(parse_clause(line, line_no, num_vars)?);
    }

    if cnf.clauses.len() < num_clauses {
        return Err(FormatError::TooFewClauses {
            expected: num_clauses,
            found: cnf.clauses.len(),
        });
    }
    Ok(cnf)
}

fn parse_header(line: &str) -> Result<(usize, usize), FormatError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
        return Err(FormatError::InvalidHeader(line.to_string()));
    }
    let num_vars = parts[2]
        .parse::<usize>()
        .map_err(|_| FormatError::InvalidHeader(line.to_string()))?;
    let num_clauses = parts[3]
        .parse::<usize>()
        .map_err(|_| FormatError::InvalidHeader(line.to_string()))?;
    Ok((num_vars, num_clauses))
}

fn parse_clause(line: &str, line_no: usize, num_vars: usize) -> Result<Vec<i32>, FormatError> {
    let mut clause = Vec::new();
    let mut terminated = false;
    for token in line.split_whitespace() {
        if terminated {
            return Err(FormatError::TrailingTokens { line: line_no });
        }
        let lit = token
            .parse::<i32>()
            .map_err(|_| FormatError::InvalidLiteral {
                token: token.to_string(),
                line: line_no,
            })?;
        if lit == 0 {
            terminated = true;
            continue;
        }
        if lit.unsigned_abs() as usize > num_vars {
            return Err(FormatError::LiteralOutOfRange {
                lit,
                line: line_no,
                num_vars,
            });
        }
        clause.push(lit);
    }
    if !terminated {
        return Err(FormatError::MissingTerminator { line: line_no });
    }
    Ok(clause)
}

pub fn to_dimacs(cnf: &Cnf) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", cnf.num_vars, cnf.clauses.len()));
    for clause in &cnf.clauses {
        for &lit in clause {
            out.push_str(&format!("{} ", lit));
        }
        out.push_str("0\n");
    }
    out
}

pub fn load_cnf<P: AsRef<Path>>(path: P) -> Result<Cnf, FormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_dimacs(&text)
}

pub fn write_cnf<P: AsRef<Path>>(path: P, cnf: &Cnf) -> Result<(), FormatError> {
    let path = path.as_ref();
    std::fs::write(path, to_dimacs(cnf)).map_err(|source| FormatError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reads a witness file: whitespace-separated `0`/`1` tokens, one per
/// variable of the formula it certifies.
pub fn load_witness<P: AsRef<Path>>(path: P, num_vars: usize) -> Result<Vec<bool>, FormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let values = text
        .split_whitespace()
        .map(|token| match token {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(FormatError::WitnessToken(other.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != num_vars {
        return Err(FormatError::WitnessLength {
            found: values.len(),
            expected: num_vars,
        });
    }
    Ok(values)
}

pub fn write_witness<P: AsRef<Path>>(path: P, assignment: &[bool]) -> Result<(), FormatError> {
    let path = path.as_ref();
    let line = assignment
        .iter()
        .map(|&v| if v { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(" ");
    std::fs::write(path, line + "\n").map_err(|source| FormatError::Io {
        path: path.display().to_string(),
        source,
    })
}
