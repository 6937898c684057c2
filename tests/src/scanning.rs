mod control;
mod output;
