#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod cancel;
pub mod fan_out;
pub mod measurer;
pub mod ramp;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

pub(crate) mod hooks;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use fan_out::FanOutRunner;
pub use measurer::{measure, SingleWorkerMeasurer};
pub use ramp::{RampController, RampReport};
pub use ramp_test::RampTest;

/// Data model and driver traits.
pub use overload_core as core;

pub mod prelude {
    pub use crate::cancel::{cancel_pair, CancelHandle, CancelSignal};
    pub use crate::ramp::{RampController, RampReport};
    pub use crate::ramp_test::RampTest;

    #[cfg(feature = "postgres")]
    pub use crate::postgres::PgConnector;

    pub use overload_core::{
        Connection, Connector, ExecutionError, ExecutionStats, Query, RampConfig, RampPhase,
        RampStep, RunResult,
    };
}
