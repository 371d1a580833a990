mod repr;
