mod include;
mod queue;
