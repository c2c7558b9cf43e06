use crate::{
    Error, PixelCalculator, Result,
    algo::expression::{Expression, Variable},
};

/// Evaluates one expression per output band on the band values of every pixel
#[derive(Debug, Clone)]
pub struct BandMaths {
    expressions: Vec<Expression>,
}

impl BandMaths {
    pub fn new<S: AsRef<str>>(expressions: &[S], variables: &[Variable]) -> Result<Self> {
        if expressions.is_empty() {
            return Err(Error::InvalidArgument("Band maths requires at least one expression".to_string()));
        }

        for (i, var) in variables.iter().enumerate() {
            if variables[..i].iter().any(|other| other.name == var.name) {
                return Err(Error::InvalidBinding(format!("Variable '{}' is defined more than once", var.name)));
            }
        }

        Ok(BandMaths {
            expressions: expressions
                .iter()
                .map(|expr| Expression::parse(expr.as_ref(), variables))
                .collect::<Result<_>>()?,
        })
    }
}

impl PixelCalculator for BandMaths {
    fn output_band_count(&self) -> usize {
        self.expressions.len()
    }

    /// Verifies that every referenced variable is available in a band vector of the given length
    fn check_band_count(&self, band_count: usize) -> Result<()> {
        for expr in &self.expressions {
            if let Some(band) = expr.highest_band()
                && band >= band_count
            {
                return Err(Error::InvalidBinding(format!(
                    "Expression '{}' references band position {band}, only {band_count} band(s) are available",
                    expr.text()
                )));
            }
        }

        Ok(())
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        for (out, expr) in output.iter_mut().zip(&self.expressions) {
            *out = expr.evaluate(bands);
        }

        Ok(())
    }
}
