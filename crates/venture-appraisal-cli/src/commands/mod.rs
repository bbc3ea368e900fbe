pub mod appraise;
