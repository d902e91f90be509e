mod activity;
mod contact;
mod daily;
mod dashboard;
mod deal;
mod follow_up;
mod goal;
mod marketing;
mod product;
mod stage;
mod user;

pub use activity::*;
pub use contact::*;
pub use daily::*;
pub use dashboard::*;
pub use deal::*;
pub use follow_up::*;
pub use goal::*;
pub use marketing::*;
pub use product::*;
pub use stage::*;
pub use user::*;
