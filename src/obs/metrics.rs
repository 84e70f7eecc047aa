// self
use crate::obs::{Component, Outcome};

/// Records a component event via the global metrics recorder (when enabled).
pub fn record_outcome(component: Component, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pacekeeper_events_total",
			"component" => component.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (component, outcome);
	}
}
