//! Summary statistics over the Pokémon table

use crate::data::Pokedex;
use crate::Stat;

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width buckets spanning their range.
    /// The top edge is inclusive so the maximum lands in the last bucket.
    pub fn new(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let mut counts = vec![0; bins];
        if values.is_empty() {
            return Histogram {
                min: 0.0,
                max: 0.0,
                counts,
            };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;

        for &v in values {
            let idx = if width > 0.0 {
                (((v - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        Histogram { min, max, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// One stat column of the table
pub fn stat_column(pokedex: &Pokedex, stat: Stat) -> Vec<f64> {
    pokedex.iter().map(|p| p.stats.get(stat) as f64).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation; NaN when either side has zero variance
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - ma, y - mb);
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va == 0.0 || vb == 0.0 {
        return f64::NAN;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Pairwise correlation of the six stats, in `Stat::ALL` order
pub fn correlation_matrix(pokedex: &Pokedex) -> Vec<Vec<f64>> {
    let columns: Vec<Vec<f64>> = Stat::ALL.iter().map(|&s| stat_column(pokedex, s)).collect();
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

/// Fixed-width text table of a correlation matrix
pub fn format_correlation_table(matrix: &[Vec<f64>]) -> String {
    let mut out = format!("{:>8}", "");
    for stat in Stat::ALL {
        out.push_str(&format!("{:>8}", stat.name()));
    }
    out.push('\n');
    for (stat, row) in Stat::ALL.iter().zip(matrix) {
        out.push_str(&format!("{:>8}", stat.name()));
        for v in row {
            out.push_str(&format!("{:>8.2}", v));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bins() {
        let values: Vec<f64> = (0..10).map(|v| v as f64).collect();
        let h = Histogram::new(&values, 5);
        assert_eq!(h.counts, vec![2, 2, 2, 2, 2]);
        assert_eq!(h.total(), 10);
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 9.0);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = Histogram::new(&[5.0, 5.0, 5.0], 30);
        assert_eq!(h.counts[0], 3);
        assert_eq!(h.max_count(), 3);
    }

    #[test]
    fn test_histogram_empty() {
        let h = Histogram::new(&[], 4);
        assert_eq!(h.counts, vec![0; 4]);
        assert_eq!(h.max_count(), 0);
    }

    #[test]
    fn test_pearson() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&a, &up) - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &down) + 1.0).abs() < 1e-12);
        assert!(pearson(&a, &[3.0; 4]).is_nan());
    }

    #[test]
    fn test_correlation_table_layout() {
        let matrix = vec![vec![1.0; 6]; 6];
        let table = format_correlation_table(&matrix);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].contains("sp_atk"));
        assert!(lines[1].trim_start().starts_with("hp"));
        assert!(lines[1].ends_with("1.00"));
    }
}
