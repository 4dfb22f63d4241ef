//! CSV instance loading.
//!
//! The format is a minimal CSV dialect: `#`-prefixed lines and blank lines
//! are comments, any line containing an alphabetic character is a header and
//! skipped, the first data line is `W,L` (stock width and length) and every
//! following data line is `id,w,l,d`.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::instance::{Instance, ItemType};

/// Loads and validates an instance from a CSV file.
pub fn load_instance(path: &Path) -> Result<Instance> {
    let text = fs::read_to_string(path)
        .map_err(|err| Error::BadInstance(format!("cannot read {}: {err}", path.display())))?;
    parse_instance(&text)
}

/// Parses an instance from CSV text.
pub fn parse_instance(text: &str) -> Result<Instance> {
    let mut stock: Option<(u32, u32)> = None;
    let mut items = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if is_comment_or_empty(line) || is_header(line) {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match stock {
            None => {
                if fields.len() < 2 {
                    return Err(Error::BadInstance(format!(
                        "line {}: expected stock dimensions `W,L`, got `{line}`",
                        line_no + 1
                    )));
                }
                let width = parse_size(fields[0], line_no, "stock width")?;
                let length = parse_size(fields[1], line_no, "stock length")?;
                stock = Some((width, length));
            }
            Some(_) => {
                if fields.len() < 4 {
                    return Err(Error::BadInstance(format!(
                        "line {}: expected item `id,w,l,d`, got `{line}`",
                        line_no + 1
                    )));
                }
                items.push(ItemType {
                    id: parse_size(fields[0], line_no, "item id")?,
                    width: parse_size(fields[1], line_no, "item width")?,
                    length: parse_size(fields[2], line_no, "item length")?,
                    demand: parse_size(fields[3], line_no, "item demand")?,
                });
            }
        }
    }

    let (stock_width, stock_length) = stock
        .ok_or_else(|| Error::BadInstance("no stock dimension line found".into()))?;
    Instance::new(stock_width, stock_length, items)
}

fn is_comment_or_empty(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

fn is_header(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic())
}

fn parse_size(field: &str, line_no: usize, what: &str) -> Result<u32> {
    let value: i64 = field.parse().map_err(|_| {
        Error::BadInstance(format!("line {}: {what} `{field}` is not a number", line_no + 1))
    })?;
    u32::try_from(value).map_err(|_| {
        Error::BadInstance(format!(
            "line {}: {what} {value} is out of range (need a non-negative 32-bit integer)",
            line_no + 1
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_comments_headers_and_data() {
        let text = "\
# two-stage cutting instance
stock_width,stock_length
20,40

id,w,l,d
0,10,10,4
1,5,20,2
";
        let instance = parse_instance(text).unwrap();
        assert_eq!(instance.stock_width, 20);
        assert_eq!(instance.stock_length, 40);
        assert_eq!(instance.num_items(), 2);
        assert_eq!(instance.items[1].demand, 2);
    }

    #[test]
    fn negative_demand_is_rejected() {
        let text = "10,10\n0,5,5,-1\n";
        assert!(matches!(
            parse_instance(text),
            Err(Error::BadInstance(_))
        ));
    }

    #[test]
    fn missing_stock_line_is_rejected() {
        assert!(parse_instance("# only comments\n").is_err());
    }

    #[test]
    fn short_item_line_is_rejected() {
        assert!(parse_instance("10,10\n0,5,5\n").is_err());
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "10,10\n0,10,10,1\n").unwrap();
        let instance = load_instance(file.path()).unwrap();
        assert_eq!(instance.num_strips(), 1);
    }
}
