pub mod completion;
pub mod doctor;
pub mod html;
pub mod report;
pub mod run;
