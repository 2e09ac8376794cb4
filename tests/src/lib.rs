mod scan;
mod sweep;
