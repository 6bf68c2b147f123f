pub mod decode;
pub mod knapsack;
