/// `num_points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, num_points: usize) -> Vec<f64> {
    match num_points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            points[n - 1] = end;
            points
        }
    }
}

/// Cumulative interface positions of a stack of layers, starting at 0.
pub fn layer_interfaces(thicknesses: &[f64]) -> Vec<f64> {
    let mut interfaces = Vec::with_capacity(thicknesses.len() + 1);
    let mut x = 0.0;
    interfaces.push(x);
    for t in thicknesses {
        x += t;
        interfaces.push(x);
    }
    interfaces
}

/// Index of the layer containing each position.
///
/// A node sitting exactly on an interface belongs to the layer on its left,
/// positions past the last interface belong to the last layer.
pub fn assign_layers(positions: &[f64], thicknesses: &[f64]) -> Vec<usize> {
    let interfaces = layer_interfaces(thicknesses);
    let last = thicknesses.len().saturating_sub(1);
    positions
        .iter()
        .map(|&x| {
            interfaces[1..]
                .iter()
                .position(|&upper| x <= upper)
                .unwrap_or(last)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let x = linspace(0.0, 3e-4, 500);
        assert_eq!(x.len(), 500);
        assert_eq!(x[0], 0.0);
        assert_eq!(x[499], 3e-4);
        assert!(x.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn nodes_are_assigned_to_layers() {
        let x = [0.0, 0.5, 1.0, 1.5, 3.0, 3.5];
        let layers = assign_layers(&x, &[1.0, 2.0]);
        assert_eq!(layers, vec![0, 0, 0, 1, 1, 1]);
    }
}
