pub mod pool;
pub mod single;
pub mod worker;

pub mod barrier {
    pub mod barrier_parallel;
}
