//! Derivative-free minimisation with the Nelder–Mead simplex

/// Stopping rules and initial simplex size
#[derive(Debug, Clone)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Stop when the spread of objective values across the simplex falls below this
    pub f_tolerance: f64,
    /// Stop when every vertex is within this distance of the best one
    pub x_tolerance: f64,
    /// Offset of the initial vertices from the starting point
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 800,
            f_tolerance: 1e-10,
            x_tolerance: 1e-7,
            initial_step: 0.5,
        }
    }
}

/// Result of a minimisation
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting from `start`.
///
/// Non-finite objective values are treated as `+inf`, so the simplex moves
/// away from regions where the objective is undefined.
pub fn nelder_mead<F>(objective: F, start: &[f64], options: &NelderMeadOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let n = start.len();
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: eval(start),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        vertex[i] += options.initial_step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        // order vertices best to worst
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        let spread = (worst - best).abs();
        let diameter = simplex[1..]
            .iter()
            .map(|v| distance(v, &simplex[0]))
            .fold(0.0_f64, f64::max);

        if best.is_finite()
            && spread <= options.f_tolerance * (1.0 + best.abs())
            && diameter <= options.x_tolerance
        {
            converged = true;
            break;
        }

        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();

        let reflected = along(&centroid, &simplex[n], -REFLECTION);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(&centroid, &simplex[n], -EXPANSION);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        // contraction, outside if the reflection improved on the worst vertex
        let (contracted, f_contracted) = if f_reflected < values[n] {
            let c = along(&centroid, &reflected, CONTRACTION);
            let f = eval(&c);
            (c, f)
        } else {
            let c = along(&centroid, &simplex[n], CONTRACTION);
            let f = eval(&c);
            (c, f)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        // shrink toward the best vertex
        let best_vertex = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = along(&best_vertex, &simplex[i], SHRINK);
            values[i] = eval(&simplex[i]);
        }
    }

    let (best_index, _) = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .unwrap_or((0, &f64::INFINITY));

    Minimum {
        x: simplex[best_index].clone(),
        value: values[best_index],
        iterations,
        converged,
    }
}

/// `origin + t * (target - origin)`
fn along(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_quadratic_bowl() {
        let f = |x: &[f64]| (x[0] - 1.5).powi(2) + 2.0 * (x[1] + 0.5).powi(2);
        let min = nelder_mead(f, &[0.0, 0.0], &NelderMeadOptions::default());

        assert!(min.converged);
        assert_approx_eq!(min.x[0], 1.5, 1e-3);
        assert_approx_eq!(min.x[1], -0.5, 1e-3);
        assert!(min.value < 1e-6);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: &[f64]| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2);
        let options = NelderMeadOptions {
            max_iterations: 5000,
            ..NelderMeadOptions::default()
        };
        let min = nelder_mead(f, &[-1.2, 1.0], &options);

        assert_approx_eq!(min.x[0], 1.0, 1e-2);
        assert_approx_eq!(min.x[1], 1.0, 2e-2);
    }

    #[test]
    fn test_avoids_undefined_region() {
        let f = |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { (x[0] - 2.0).powi(2) };
        let min = nelder_mead(f, &[1.0], &NelderMeadOptions::default());
        assert_approx_eq!(min.x[0], 2.0, 1e-3);
    }

    #[test]
    fn test_iteration_cap() {
        let f = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
        let options = NelderMeadOptions {
            max_iterations: 3,
            ..NelderMeadOptions::default()
        };
        let min = nelder_mead(f, &[5.0, 5.0, 5.0], &options);
        assert!(!min.converged);
        assert_eq!(min.iterations, 3);
    }
}
