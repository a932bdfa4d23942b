pub mod cancel;
pub mod dag;
pub mod graph;
pub mod paths;
pub mod plan;
pub mod prefix;
pub mod process;
pub mod run;
pub mod semaphore;
pub mod signal;
pub mod target;
pub mod terminal;
pub mod trace;
