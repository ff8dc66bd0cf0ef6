pub mod trace_events;
