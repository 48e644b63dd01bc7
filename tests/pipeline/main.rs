
mod decision;
mod degrade;
mod end_to_end;
