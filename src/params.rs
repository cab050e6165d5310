use num_traits::{Float, NumCast};
use serde::{Deserialize, Serialize};

use crate::error::{FtrlErr, Result};

/// The hyperparameters of a single FTRL-proximal update.
///
/// They're read-only for the whole call and shared by every coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FtrlParams<T> {
    /// Learning-rate scale, must be positive.
    pub alpha: T,
    /// Learning-rate offset.
    pub beta: T,
    /// L1 regularization strength.
    pub lambda1: T,
    /// L2 regularization strength.
    pub lambda2: T,
}

impl<T: Float> FtrlParams<T> {
    /// Creates a new `FtrlParams` holding the given values verbatim.
    ///
    /// Nothing is checked here, the kernel assumes `alpha > 0`. Call `validate`
    /// when the values come from an untrusted source.
    ///
    /// # Arguments
    /// * `alpha` - The learning-rate scale.
    /// * `beta` - The learning-rate offset.
    /// * `lambda1` - The L1 regularization strength.
    /// * `lambda2` - The L2 regularization strength.
    ///
    /// # Returns
    /// A new `FtrlParams` instance.
    pub fn new(alpha: T, beta: T, lambda1: T, lambda2: T) -> Self {
        Self {
            alpha,
            beta,
            lambda1,
            lambda2,
        }
    }

    /// Checks that `alpha` is positive and the rest are non-negative, all of them finite.
    ///
    /// # Returns
    /// An `InvalidParam` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let Self {
            alpha,
            beta,
            lambda1,
            lambda2,
        } = *self;

        if !alpha.is_finite() || alpha <= T::zero() {
            return Err(invalid("alpha", alpha));
        }

        for (name, value) in [("beta", beta), ("lambda1", lambda1), ("lambda2", lambda2)] {
            if !value.is_finite() || value < T::zero() {
                return Err(invalid(name, value));
            }
        }

        Ok(())
    }
}

fn invalid<T: Float>(name: &'static str, value: T) -> FtrlErr {
    FtrlErr::InvalidParam {
        name,
        value: value.to_f64().unwrap_or(f64::NAN),
    }
}

/// The serializable specification of an FTRL optimizer.
///
/// Only `alpha` is required, the remaining terms default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FtrlSpec {
    pub alpha: f64,
    #[serde(default)]
    pub beta: f64,
    #[serde(default)]
    pub lambda1: f64,
    #[serde(default)]
    pub lambda2: f64,
}

impl FtrlSpec {
    /// Parses a spec from its JSON representation.
    ///
    /// # Arguments
    /// * `json` - A JSON object with `alpha` and optionally `beta`, `lambda1` and `lambda2`.
    ///
    /// # Returns
    /// The parsed spec or a `Config` error.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves this spec into validated parameters of the float type `T`.
    ///
    /// # Returns
    /// The parameters, or an `InvalidParam` error if a value doesn't fit in `T`
    /// or fails `FtrlParams::validate`.
    pub fn build<T: Float>(&self) -> Result<FtrlParams<T>> {
        let cast = |name: &'static str, value: f64| {
            <T as NumCast>::from(value).ok_or(FtrlErr::InvalidParam { name, value })
        };

        let params = FtrlParams::new(
            cast("alpha", self.alpha)?,
            cast("beta", self.beta)?,
            cast("lambda1", self.lambda1)?,
            cast("lambda2", self.lambda2)?,
        );

        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_optional_terms() {
        let spec = FtrlSpec::from_json(r#"{ "alpha": 0.5 }"#).unwrap();
        assert_eq!(
            spec,
            FtrlSpec {
                alpha: 0.5,
                beta: 0.,
                lambda1: 0.,
                lambda2: 0.,
            }
        );

        let params: FtrlParams<f32> = spec.build().unwrap();
        assert_eq!(params, FtrlParams::new(0.5, 0., 0., 0.));
    }

    #[test]
    fn test_spec_rejects_unknown_fields() {
        let res = FtrlSpec::from_json(r#"{ "alpha": 1.0, "gamma": 2.0 }"#);
        assert!(matches!(res, Err(FtrlErr::Config(_))));
    }

    #[test]
    fn test_spec_requires_alpha() {
        let res = FtrlSpec::from_json(r#"{ "beta": 1.0 }"#);
        assert!(matches!(res, Err(FtrlErr::Config(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_alpha() {
        for alpha in [0., -1., f32::NAN, f32::INFINITY] {
            let res = FtrlParams::new(alpha, 0., 0., 0.).validate();
            assert!(
                matches!(res, Err(FtrlErr::InvalidParam { name: "alpha", .. })),
                "alpha {alpha} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_negative_regularization() {
        let res = FtrlParams::new(1., 0., -0.1, 0.).validate();
        assert!(matches!(
            res,
            Err(FtrlErr::InvalidParam {
                name: "lambda1",
                ..
            })
        ));

        let res = FtrlParams::new(1., 0., 0., -2.).validate();
        assert!(matches!(
            res,
            Err(FtrlErr::InvalidParam {
                name: "lambda2",
                ..
            })
        ));
    }

    #[test]
    fn test_build_reports_out_of_range_value() {
        let spec = FtrlSpec {
            alpha: 1e300,
            beta: 0.,
            lambda1: 0.,
            lambda2: 0.,
        };

        // 1e300 doesn't fit in an f32.
        let res = spec.build::<f32>();
        assert!(matches!(res, Err(FtrlErr::InvalidParam { name: "alpha", .. })));
        assert!(spec.build::<f64>().is_ok());
    }
}
