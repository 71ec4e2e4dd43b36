//! Box-constrained local optimizers used by multi-start local search.
//!
//! Both optimizers run on a hard evaluation budget and always report the best
//! finite point they have seen, even when they stop early.

use ela_core::{Bounds, Objective};

/// Why an optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A convergence tolerance was met.
    Converged,
    /// The evaluation budget ran out.
    BudgetExhausted,
    /// No step along the search direction decreased the objective.
    LineSearchStalled,
    /// No finite objective value was ever observed.
    Diverged,
}

/// Outcome of a single local optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResult {
    /// Best point found.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub f: f64,
    /// Evaluations consumed, never more than the budget.
    pub evaluations: usize,
    /// Reason for stopping.
    pub termination: Termination,
}

/// Tuning knobs of the projected L-BFGS method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbfgsbSettings {
    /// Number of correction pairs kept.
    pub history: usize,
    /// Stop when the projected gradient's infinity norm drops below this.
    pub pgtol: f64,
    /// Stop when the relative decrease of one iteration drops below this.
    pub ftol: f64,
    /// Finite-difference step.
    pub fd_step: f64,
    /// Armijo sufficient-decrease constant.
    pub armijo: f64,
    /// Backtracking halvings before the line search gives up.
    pub max_backtracks: usize,
}

impl Default for LbfgsbSettings {
    fn default() -> Self {
        Self {
            history: 10,
            pgtol: 1e-5,
            ftol: 2.220446049250313e-9,
            fd_step: 1e-8,
            armijo: 1e-4,
            max_backtracks: 30,
        }
    }
}

/// Tolerances of the bounded Nelder-Mead method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadSettings {
    /// Absolute spread of the simplex vertices at convergence.
    pub xatol: f64,
    /// Absolute spread of the vertex values at convergence.
    pub fatol: f64,
}

impl Default for NelderMeadSettings {
    fn default() -> Self {
        Self {
            xatol: 1e-4,
            fatol: 1e-4,
        }
    }
}

struct Exhausted;

/// Evaluation gate that enforces the budget and remembers the best finite point.
struct Budgeted<'a> {
    f: &'a dyn Objective,
    limit: usize,
    used: usize,
    best: Option<(Vec<f64>, f64)>,
}

impl<'a> Budgeted<'a> {
    fn new(f: &'a dyn Objective, limit: usize) -> Self {
        Self {
            f,
            limit,
            used: 0,
            best: None,
        }
    }

    fn eval(&mut self, x: &[f64]) -> Result<f64, Exhausted> {
        if self.used >= self.limit {
            return Err(Exhausted);
        }
        self.used += 1;
        let value = self.f.evaluate(x);
        if value.is_finite() && self.best.as_ref().map_or(true, |(_, best)| value < *best) {
            self.best = Some((x.to_vec(), value));
        }
        Ok(value)
    }

    fn finish(self, start: &[f64], termination: Termination) -> OptimizeResult {
        match self.best {
            Some((x, f)) => OptimizeResult {
                x,
                f,
                evaluations: self.used,
                termination,
            },
            None => OptimizeResult {
                x: start.to_vec(),
                f: f64::NAN,
                evaluations: self.used,
                termination: Termination::Diverged,
            },
        }
    }
}

fn project(x: &mut [f64], bounds: &Bounds) {
    for (value, (lo, hi)) in x.iter_mut().zip(bounds.pairs()) {
        *value = value.clamp(lo, hi);
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Finite-difference gradient; backward differences at the upper bound.
fn gradient(
    budget: &mut Budgeted<'_>,
    bounds: &Bounds,
    x: &[f64],
    fx: f64,
    step: f64,
) -> Result<Vec<f64>, Exhausted> {
    let mut grad = vec![0.0; x.len()];
    let mut probe = x.to_vec();
    for (i, (_, hi)) in bounds.pairs().enumerate() {
        let h = if x[i] + step > hi { -step } else { step };
        probe[i] = x[i] + h;
        let fp = budget.eval(&probe)?;
        grad[i] = (fp - fx) / h;
        probe[i] = x[i];
    }
    Ok(grad)
}

/// Two-loop recursion producing `-H·g`.
fn lbfgs_direction(grad: &[f64], s_hist: &[Vec<f64>], y_hist: &[Vec<f64>]) -> Vec<f64> {
    let mut q: Vec<f64> = grad.iter().map(|g| -g).collect();
    let k = s_hist.len();
    if k == 0 {
        return q;
    }
    let mut alpha = vec![0.0; k];
    let rho: Vec<f64> = (0..k).map(|i| 1.0 / dot(&y_hist[i], &s_hist[i])).collect();
    for i in (0..k).rev() {
        alpha[i] = rho[i] * dot(&s_hist[i], &q);
        for (qj, yj) in q.iter_mut().zip(&y_hist[i]) {
            *qj -= alpha[i] * yj;
        }
    }
    let gamma = dot(&s_hist[k - 1], &y_hist[k - 1]) / dot(&y_hist[k - 1], &y_hist[k - 1]);
    for qj in q.iter_mut() {
        *qj *= gamma;
    }
    for i in 0..k {
        let beta = rho[i] * dot(&y_hist[i], &q);
        for (qj, sj) in q.iter_mut().zip(&s_hist[i]) {
            *qj += sj * (alpha[i] - beta);
        }
    }
    q
}

/// Zeroes direction components that would push an active coordinate outside the box.
fn mask_active(direction: &mut [f64], x: &[f64], bounds: &Bounds) {
    for ((d, xi), (lo, hi)) in direction.iter_mut().zip(x).zip(bounds.pairs()) {
        if (*xi <= lo && *d < 0.0) || (*xi >= hi && *d > 0.0) {
            *d = 0.0;
        }
    }
}

fn projected_gradient_norm(x: &[f64], grad: &[f64], bounds: &Bounds) -> f64 {
    x.iter()
        .zip(grad)
        .zip(bounds.pairs())
        .map(|((xi, gi), (lo, hi))| ((xi - gi).clamp(lo, hi) - xi).abs())
        .fold(0.0, f64::max)
}

/// Projected limited-memory BFGS with finite-difference gradients.
pub fn lbfgsb(
    f: &dyn Objective,
    bounds: &Bounds,
    x0: &[f64],
    max_evaluations: usize,
    settings: LbfgsbSettings,
) -> OptimizeResult {
    let mut budget = Budgeted::new(f, max_evaluations);
    let termination = lbfgsb_loop(&mut budget, bounds, x0, settings);
    budget.finish(x0, termination)
}

fn lbfgsb_loop(
    budget: &mut Budgeted<'_>,
    bounds: &Bounds,
    x0: &[f64],
    settings: LbfgsbSettings,
) -> Termination {
    let mut x = x0.to_vec();
    project(&mut x, bounds);
    let mut fx = match budget.eval(&x) {
        Ok(value) => value,
        Err(Exhausted) => return Termination::BudgetExhausted,
    };
    if !fx.is_finite() {
        return Termination::Diverged;
    }
    let mut grad = match gradient(budget, bounds, &x, fx, settings.fd_step) {
        Ok(grad) => grad,
        Err(Exhausted) => return Termination::BudgetExhausted,
    };
    let mut s_hist: Vec<Vec<f64>> = Vec::with_capacity(settings.history);
    let mut y_hist: Vec<Vec<f64>> = Vec::with_capacity(settings.history);

    loop {
        if projected_gradient_norm(&x, &grad, bounds) <= settings.pgtol {
            return Termination::Converged;
        }
        let mut direction = lbfgs_direction(&grad, &s_hist, &y_hist);
        mask_active(&mut direction, &x, bounds);
        if dot(&grad, &direction) >= 0.0 {
            // curvature information went stale; restart from steepest descent
            s_hist.clear();
            y_hist.clear();
            direction = grad.iter().map(|g| -g).collect();
            mask_active(&mut direction, &x, bounds);
            if dot(&grad, &direction) >= 0.0 {
                return Termination::Converged;
            }
        }

        let norm = dot(&direction, &direction).sqrt();
        let mut alpha = if s_hist.is_empty() {
            (1.0 / norm).min(1.0)
        } else {
            1.0
        };
        let mut accepted = None;
        for _ in 0..settings.max_backtracks {
            let mut candidate: Vec<f64> =
                x.iter().zip(&direction).map(|(xi, di)| xi + alpha * di).collect();
            project(&mut candidate, bounds);
            let step: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
            let fc = match budget.eval(&candidate) {
                Ok(value) => value,
                Err(Exhausted) => return Termination::BudgetExhausted,
            };
            if fc.is_finite() && fc <= fx + settings.armijo * dot(&grad, &step) {
                accepted = Some((candidate, step, fc));
                break;
            }
            alpha *= 0.5;
        }
        let Some((x_new, step, f_new)) = accepted else {
            return Termination::LineSearchStalled;
        };

        let grad_new = match gradient(budget, bounds, &x_new, f_new, settings.fd_step) {
            Ok(grad) => grad,
            Err(Exhausted) => return Termination::BudgetExhausted,
        };
        let y: Vec<f64> = grad_new.iter().zip(&grad).map(|(a, b)| a - b).collect();
        if dot(&step, &y) > 1e-10 {
            if s_hist.len() == settings.history {
                s_hist.remove(0);
                y_hist.remove(0);
            }
            s_hist.push(step);
            y_hist.push(y);
        }

        let scale = fx.abs().max(f_new.abs()).max(1.0);
        let decrease = (fx - f_new) / scale;
        x = x_new;
        fx = f_new;
        grad = grad_new;
        if decrease <= settings.ftol {
            return Termination::Converged;
        }
    }
}

/// Nelder-Mead simplex search with every vertex clipped into the box.
pub fn nelder_mead(
    f: &dyn Objective,
    bounds: &Bounds,
    x0: &[f64],
    max_evaluations: usize,
    settings: NelderMeadSettings,
) -> OptimizeResult {
    let mut budget = Budgeted::new(f, max_evaluations);
    let termination = match nelder_mead_loop(&mut budget, bounds, x0, settings) {
        Ok(termination) => termination,
        Err(Exhausted) => Termination::BudgetExhausted,
    };
    budget.finish(x0, termination)
}

fn ordering_value(value: f64) -> f64 {
    if value.is_nan() {
        f64::INFINITY
    } else {
        value
    }
}

fn nelder_mead_loop(
    budget: &mut Budgeted<'_>,
    bounds: &Bounds,
    x0: &[f64],
    settings: NelderMeadSettings,
) -> Result<Termination, Exhausted> {
    const REFLECT: f64 = 1.0;
    const EXPAND: f64 = 2.0;
    const CONTRACT: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let n = x0.len();
    let mut start = x0.to_vec();
    project(&mut start, bounds);

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for (i, (lo, hi)) in bounds.pairs().enumerate() {
        let mut vertex = start.clone();
        let delta = if vertex[i] != 0.0 {
            0.05 * vertex[i].abs()
        } else {
            0.00025
        };
        vertex[i] = if vertex[i] + delta <= hi {
            vertex[i] + delta
        } else {
            (vertex[i] - delta).max(lo)
        };
        simplex.push(vertex);
    }
    let mut values = Vec::with_capacity(n + 1);
    for vertex in &simplex {
        values.push(budget.eval(vertex)?);
    }

    loop {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|a, b| ordering_value(values[*a]).total_cmp(&ordering_value(values[*b])));
        simplex = order.iter().map(|i| simplex[*i].clone()).collect();
        values = order.iter().map(|i| values[*i]).collect();

        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = values[1..]
            .iter()
            .map(|v| (v - values[0]).abs())
            .fold(0.0, f64::max);
        if x_spread <= settings.xatol && f_spread <= settings.fatol {
            return Ok(Termination::Converged);
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |coef: f64| -> Vec<f64> {
            let mut point: Vec<f64> = centroid
                .iter()
                .zip(&simplex[n])
                .map(|(c, w)| c + coef * (c - w))
                .collect();
            project(&mut point, bounds);
            point
        };

        let worst = ordering_value(values[n]);
        let second_worst = ordering_value(values[n - 1]);
        let best = ordering_value(values[0]);

        let reflected = along(REFLECT);
        let fr = ordering_value(budget.eval(&reflected)?);
        if fr < best {
            let expanded = along(REFLECT * EXPAND);
            let fe = ordering_value(budget.eval(&expanded)?);
            if fe < fr {
                simplex[n] = expanded;
                values[n] = fe;
            } else {
                simplex[n] = reflected;
                values[n] = fr;
            }
            continue;
        }
        if fr < second_worst {
            simplex[n] = reflected;
            values[n] = fr;
            continue;
        }
        let (contracted, threshold) = if fr < worst {
            (along(REFLECT * CONTRACT), fr)
        } else {
            (along(-CONTRACT), worst)
        };
        let fc = ordering_value(budget.eval(&contracted)?);
        if fc <= threshold {
            simplex[n] = contracted;
            values[n] = fc;
            continue;
        }
        let anchor = simplex[0].clone();
        for k in 1..=n {
            for (x, a) in simplex[k].iter_mut().zip(&anchor) {
                *x = a + SHRINK * (*x - a);
            }
            values[k] = budget.eval(&simplex[k])?;
        }
    }
}
