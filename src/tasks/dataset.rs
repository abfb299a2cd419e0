use anyhow::Result;
use csv::ReaderBuilder;
use log::{debug, error};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    fs::File,
    io::Read,
    path::Path,
    str::FromStr,
};

pub const KEY_COLUMN: &str = "block_number";
pub const VALUE_COLUMN: &str = "elapsed_time_ms";

/// Execution modes for which per-block statistics are collected. The
/// sequential mode is the baseline every speedup is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExecutionMode {
    Seq,
    Deter,
    Optim,
    OptimPartial,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Seq => write!(f, "seq"),
            ExecutionMode::Deter => write!(f, "deter"),
            ExecutionMode::Optim => write!(f, "optim"),
            ExecutionMode::OptimPartial => write!(f, "optim_partial"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(input: &str) -> Result<ExecutionMode, Self::Err> {
        match input {
            "seq" => Ok(ExecutionMode::Seq),
            "deter" => Ok(ExecutionMode::Deter),
            "optim" => Ok(ExecutionMode::Optim),
            "optim_partial" => Ok(ExecutionMode::OptimPartial),
            _ => Err(()),
        }
    }
}

impl ExecutionMode {
    pub fn file_name(&self) -> String {
        format!("block_stats_{self}.csv")
    }
}

/// Per-key measurements read from one column of a CSV file.
#[derive(Debug, Clone)]
pub struct BlockStats {
    pub column: String,
    rows: BTreeMap<u64, f64>,
}

impl BlockStats {
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_columns(path, KEY_COLUMN, VALUE_COLUMN)
    }

    pub fn from_path_with_columns(path: &Path, key: &str, value: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            let reason = format!("error opening csv (path={}, error={e:?})", path.display());
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;

        let stats = Self::from_reader_with_columns(file, key, value).map_err(|e| {
            error!("error loading csv (path={}, error={e})", path.display());
            e.context(format!("loading {}", path.display()))
        })?;
        debug!(
            "loaded {} rows from {} (column={value})",
            stats.len(),
            path.display()
        );

        Ok(stats)
    }

    pub fn from_reader_with_columns<R: Read>(reader: R, key: &str, value: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                anyhow::anyhow!(
                    "missing column (column={name}, headers={})",
                    headers.iter().collect::<Vec<_>>().join(",")
                )
            })
        };
        let key_idx = column_index(key)?;
        let value_idx = column_index(value)?;

        let mut rows = BTreeMap::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            // Header is line 1.
            let line = line + 2;

            let raw_key = record.get(key_idx).unwrap_or_default();
            let parsed_key: u64 = raw_key.parse().map_err(|e| {
                anyhow::anyhow!("bad key (line={line}, column={key}, value={raw_key:?}, error={e})")
            })?;

            let raw_value = record.get(value_idx).unwrap_or_default();
            let parsed_value: f64 = raw_value.parse().map_err(|e| {
                anyhow::anyhow!(
                    "bad value (line={line}, column={value}, value={raw_value:?}, error={e})"
                )
            })?;
            if !parsed_value.is_finite() || parsed_value <= 0.0 {
                anyhow::bail!(
                    "elapsed time must be positive and finite (line={line}, key={parsed_key}, value={parsed_value})"
                );
            }

            if rows.insert(parsed_key, parsed_value).is_some() {
                anyhow::bail!("duplicated key (line={line}, key={parsed_key})");
            }
        }

        Ok(Self {
            column: value.to_string(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: u64) -> Option<f64> {
        self.rows.get(&key).copied()
    }

    pub fn keys(&self) -> BTreeSet<u64> {
        self.rows.keys().copied().collect()
    }
}

impl FromIterator<(u64, f64)> for BlockStats {
    fn from_iter<I: IntoIterator<Item = (u64, f64)>>(iter: I) -> Self {
        Self {
            column: VALUE_COLUMN.to_string(),
            rows: iter.into_iter().collect(),
        }
    }
}

/// Keys present in every dataset. An empty slice has no common keys.
pub fn common_keys(datasets: &[&BlockStats]) -> BTreeSet<u64> {
    let Some((first, rest)) = datasets.split_first() else {
        return BTreeSet::new();
    };

    first
        .rows
        .keys()
        .copied()
        .filter(|key| rest.iter().all(|other| other.rows.contains_key(key)))
        .collect()
}

pub fn load_mode(data_dir: &Path, mode: ExecutionMode) -> Result<BlockStats> {
    BlockStats::from_path(&data_dir.join(mode.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<BlockStats> {
        BlockStats::from_reader_with_columns(csv.as_bytes(), KEY_COLUMN, VALUE_COLUMN)
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let stats = parse(
            "block_number,tx_count,elapsed_time_ms\n\
             100,12,4.5\n\
             101,3,1.25\n",
        )
        .unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get(100), Some(4.5));
        assert_eq!(stats.get(101), Some(1.25));
        assert_eq!(stats.get(102), None);
    }

    #[test]
    fn test_missing_column_fails() {
        let err = parse("block,elapsed_time_ms\n1,2.0\n").unwrap_err();
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn test_duplicated_key_fails() {
        let err = parse("block_number,elapsed_time_ms\n7,1.0\n7,2.0\n").unwrap_err();
        assert!(err.to_string().contains("duplicated key"));
    }

    #[test]
    fn test_non_positive_time_fails() {
        assert!(parse("block_number,elapsed_time_ms\n7,0\n").is_err());
        assert!(parse("block_number,elapsed_time_ms\n7,-1.5\n").is_err());
        assert!(parse("block_number,elapsed_time_ms\n7,inf\n").is_err());
    }

    #[test]
    fn test_common_keys_across_three() {
        let a: BlockStats = [(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)].into_iter().collect();
        let b: BlockStats = [(2, 1.0), (3, 1.0), (4, 1.0)].into_iter().collect();
        let c: BlockStats = [(1, 1.0), (3, 1.0), (4, 1.0)].into_iter().collect();

        let common = common_keys(&[&a, &b, &c]);
        assert_eq!(common.into_iter().collect::<Vec<_>>(), vec![3, 4]);
        assert!(common_keys(&[]).is_empty());
    }

    #[test]
    fn test_mode_file_names() {
        assert_eq!(ExecutionMode::Seq.file_name(), "block_stats_seq.csv");
        assert_eq!(
            ExecutionMode::OptimPartial.file_name(),
            "block_stats_optim_partial.csv"
        );
        assert_eq!("deter".parse(), Ok(ExecutionMode::Deter));
    }
}
