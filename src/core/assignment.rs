//! Linear assignment over rectangular cost matrices
//!
//! Formulated as a 0/1 program: one variable per cell, every row of the
//! shorter side assigned exactly once, every line of the longer side at most
//! once. The constraint matrix is totally unimodular, so the relaxation is
//! already integral and the solver never has to branch.

use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};

use crate::error::{MatchingError, Result};

/// Row-major cost matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    pub fn from_fn(rows: usize, cols: usize, mut cost: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(cost(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(MatchingError::Solver("cost matrix rows differ in length".to_string()));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// Minimum-cost assignment of `min(rows, cols)` rows to distinct columns
///
/// Returns `(row, col)` pairs sorted by row. An empty matrix yields no pairs.
pub fn solve(matrix: &CostMatrix) -> Result<Vec<(usize, usize)>> {
    if matrix.rows == 0 || matrix.cols == 0 {
        return Ok(Vec::new());
    }
    if matrix.data.iter().any(|c| !c.is_finite()) {
        return Err(MatchingError::Solver("cost matrix contains non-finite values".to_string()));
    }

    let mut vars = ProblemVariables::new();
    let cells: Vec<Variable> = (0..matrix.rows * matrix.cols)
        .map(|_| vars.add(variable().binary()))
        .collect();
    let cell = |i: usize, j: usize| cells[i * matrix.cols + j];

    let objective: Expression = (0..matrix.rows)
        .flat_map(|i| (0..matrix.cols).map(move |j| (i, j)))
        .map(|(i, j)| matrix.get(i, j) * cell(i, j))
        .sum();

    let mut model = vars.minimise(objective).using(default_solver);

    let rows_are_short = matrix.rows <= matrix.cols;
    for i in 0..matrix.rows {
        let assigned: Expression = (0..matrix.cols).map(|j| cell(i, j)).sum();
        model = if rows_are_short {
            model.with(constraint!(assigned == 1))
        } else {
            model.with(constraint!(assigned <= 1))
        };
    }
    for j in 0..matrix.cols {
        let assigned: Expression = (0..matrix.rows).map(|i| cell(i, j)).sum();
        model = if rows_are_short {
            model.with(constraint!(assigned <= 1))
        } else {
            model.with(constraint!(assigned == 1))
        };
    }

    let solution = model
        .solve()
        .map_err(|e| MatchingError::Solver(e.to_string()))?;

    let pairs: Vec<(usize, usize)> = (0..matrix.rows)
        .flat_map(|i| (0..matrix.cols).map(move |j| (i, j)))
        .filter(|&(i, j)| solution.value(cell(i, j)) > 0.5)
        .collect();

    if pairs.len() != matrix.rows.min(matrix.cols) {
        return Err(MatchingError::Solver(format!(
            "solver returned {} assignments for a {}x{} matrix",
            pairs.len(),
            matrix.rows,
            matrix.cols
        )));
    }

    Ok(pairs)
}
