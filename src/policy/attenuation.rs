//! Built-in attenuation modes.

use serde::{Deserialize, Serialize};

use super::{AttenuationMode, Context};
use crate::model::VertexId;
use crate::Result;

const DECAY_BASE: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Attenuation {
    /// Forward everything.
    #[default]
    None,
    /// Forward a constant share.
    Fixed(f64),
    /// `0.99^pulse * factor`: the forwarded share shrinks every pulse.
    Decaying(f64),
}

impl AttenuationMode for Attenuation {
    fn attenuation(&self, ctx: &Context<'_>, _vertex: VertexId) -> Result<f64> {
        Ok(match *self {
            Attenuation::None => 1.0,
            Attenuation::Fixed(factor) => factor,
            Attenuation::Decaying(factor) => DECAY_BASE.powi(ctx.pulse() as i32) * factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::tests::Fixture;

    #[test]
    fn test_variants() {
        let fx = Fixture::chain();
        let ctx = fx.ctx(2);
        assert_eq!(Attenuation::None.attenuation(&ctx, fx.a).unwrap(), 1.0);
        assert_eq!(Attenuation::Fixed(0.5).attenuation(&ctx, fx.a).unwrap(), 0.5);
        let decayed = Attenuation::Decaying(0.5).attenuation(&ctx, fx.a).unwrap();
        assert!((decayed - 0.99 * 0.99 * 0.5).abs() < 1e-12);
    }
}
