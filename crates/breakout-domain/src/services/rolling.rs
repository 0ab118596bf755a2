use std::collections::VecDeque;

/// Trailing simple moving average. The current value is part of its own window.
#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        self.sum += value;
        while self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
            }
        }

        if self.buf.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Rolling mean over a whole series, `None` until the window fills.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut sma = RollingSma::new(window);
    values.iter().map(|value| sma.update(*value)).collect()
}

#[cfg(test)]
mod tests {
    use super::{rolling_mean, RollingSma};

    #[test]
    fn sma_waits_for_full_window() {
        let mut sma = RollingSma::new(3);
        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(2.0), None);
        assert_eq!(sma.update(3.0), Some(2.0));
        assert_eq!(sma.update(7.0), Some(4.0));
    }

    #[test]
    fn zero_window_never_emits() {
        let mut sma = RollingSma::new(0);
        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(1.0), None);
    }

    #[test]
    fn rolling_mean_includes_current_value() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let means = rolling_mean(&values, 2);
        assert_eq!(means, vec![None, Some(15.0), Some(25.0), Some(35.0)]);
    }
}
