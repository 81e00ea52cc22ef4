use thiserror::Error;

#[derive(Debug, Error)]
pub enum RescueError {
    /// Item generation would exceed the evaluation budget at the current
    /// capacity.  Handled internally by retrying with a smaller capacity;
    /// never reaches the driver.
    #[error("item generation exceeded the evaluation budget ({0} evaluations)")]
    BudgetExceeded(usize),
}

pub type RescueResult<T> = Result<T, RescueError>;
