mod hot_reload;
mod stand_up_ramp;
mod startup;
mod transitions;
